use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capture::ArtifactMetadata;
use crate::status::RecorderSignal;

/// Recorder state machine.
///
/// `Provisioning` covers capture-surface setup and stream acquisition;
/// `Stopping` covers the window between the stop command and the device
/// acknowledging it. Errors in any non-terminal state fall back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderStatus {
    Idle,
    Provisioning,
    Recording,
    Stopping,
}

impl RecorderStatus {
    /// The two-phase view exposed over the wire and broadcast to UIs.
    pub fn signal(&self) -> RecorderSignal {
        match self {
            RecorderStatus::Idle | RecorderStatus::Provisioning => RecorderSignal::Idle,
            RecorderStatus::Recording | RecorderStatus::Stopping => RecorderSignal::Recording,
        }
    }
}

/// One start-to-stop recording attempt and its metadata.
///
/// Source title, url, dimensions and zoom are captured at start and
/// immutable thereafter. `ended_at` is set only on stop. All fields clear
/// when a new session is requested while idle, or on explicit reset.
#[derive(Debug, Clone, Default)]
pub struct RecordingSession {
    pub session_id: Option<Uuid>,
    pub source_tab_id: Option<u64>,
    pub source_title: String,
    pub source_url: String,
    /// Capture width: 2x the visible tab width, fixed at start
    pub width: u32,
    /// Capture height: 2x the visible tab height, fixed at start
    pub height: u32,
    /// Page zoom percentage at start; -1 when unavailable
    pub zoom: f64,
    pub stream_id: String,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl RecordingSession {
    pub fn clear(&mut self) {
        *self = RecordingSession::default();
    }

    /// Snapshot of the descriptive metadata an artifact carries. Duration
    /// is filled in later from the device-side instants.
    pub fn artifact_metadata(&self) -> ArtifactMetadata {
        ArtifactMetadata {
            width: self.width,
            height: self.height,
            duration_secs: 0.0,
            page_title: self.source_title.clone(),
            page_url: self.source_url.clone(),
            zoom: self.zoom,
        }
    }
}
