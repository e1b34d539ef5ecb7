use std::sync::Arc;

use crate::session::RecordingCoordinator;
use crate::status::StatusBroadcaster;
use crate::store::SharedStore;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<RecordingCoordinator>,
    pub store: SharedStore,
    pub status: StatusBroadcaster,
}
