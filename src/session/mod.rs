//! Recording session management
//!
//! The `RecordingCoordinator` owns the session lifecycle: it validates
//! state transitions, provisions the capture surface, snapshots session
//! metadata, and hands finished artifacts to the upload pipeline.

mod coordinator;
mod state;

pub use coordinator::{RecordingCoordinator, CAPTURE_SCALE, MAX_FRAME_RATE};
pub use state::{RecorderStatus, RecordingSession};
