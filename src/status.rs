use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Two-phase recorder state as seen by UI surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderSignal {
    Idle,
    Recording,
}

/// Upload pipeline status, observable process-wide.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    #[default]
    Idle,
    Uploading,
    Success,
    Error,
}

/// A status transition published by the coordinator or the upload pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "status", rename_all = "lowercase")]
pub enum StatusEvent {
    Recorder(RecorderSignal),
    Upload(UploadStatus),
}

/// Fan-out of status transitions to any number of listening UI surfaces.
///
/// Publish order is preserved per publisher. Delivery is best-effort: a
/// publisher is never failed by absent or lagging listeners.
#[derive(Clone)]
pub struct StatusBroadcaster {
    tx: broadcast::Sender<StatusEvent>,
}

impl StatusBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: StatusEvent) {
        debug!("Publishing status event: {:?}", event);
        // No receivers is not an error for the publisher
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.tx.subscribe()
    }
}

impl Default for StatusBroadcaster {
    fn default() -> Self {
        Self::new(64)
    }
}
