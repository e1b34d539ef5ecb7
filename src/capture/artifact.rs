use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of finished capture output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Image,
    Video,
}

impl ArtifactKind {
    /// Mime tag recorded on the artifact itself.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ArtifactKind::Image => "image/jpeg",
            ArtifactKind::Video => "video/webm;codecs=vp9",
        }
    }

    /// Content type sent on destination requests and blob transfers.
    pub fn content_type(&self) -> &'static str {
        match self {
            ArtifactKind::Image => "image/jpeg",
            ArtifactKind::Video => "video/webm",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Image => "jpeg",
            ArtifactKind::Video => "webm",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            ArtifactKind::Image => "image",
            ArtifactKind::Video => "video",
        }
    }

    /// Object-storage key namespace for this kind.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            ArtifactKind::Image => "screenshot",
            ArtifactKind::Video => "videos_raw",
        }
    }

    pub fn filename_stem(&self) -> &'static str {
        match self {
            ArtifactKind::Image => "screenshot",
            ArtifactKind::Video => "screenrecording",
        }
    }

    /// Remote-side processing status reported at finalize time. Images are
    /// usable as-is; videos go through server-side conversion.
    pub fn finish_status(&self) -> &'static str {
        match self {
            ArtifactKind::Image => "done",
            ArtifactKind::Video => "converting",
        }
    }
}

/// Descriptive metadata snapshotted from the owning session when the
/// artifact is created.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub width: u32,
    pub height: u32,
    pub duration_secs: f64,
    pub page_title: String,
    pub page_url: String,
    pub zoom: f64,
}

/// The finished binary output of a capture session.
///
/// Created once when capture stops, consumed exactly once by the upload
/// pipeline. The shared store may keep the last artifact around for a
/// manual fallback download until the session resets.
#[derive(Debug, Clone)]
pub struct CapturedArtifact {
    pub id: Uuid,
    pub kind: ArtifactKind,
    pub mime_type: &'static str,
    pub payload: Vec<u8>,
    pub metadata: ArtifactMetadata,
    pub created_at: DateTime<Utc>,
}

impl CapturedArtifact {
    pub fn new(kind: ArtifactKind, payload: Vec<u8>, metadata: ArtifactMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            mime_type: kind.mime_type(),
            payload,
            metadata,
            created_at: Utc::now(),
        }
    }

    /// Object-storage key this artifact uploads under.
    pub fn storage_key(&self) -> String {
        format!("{}/{}.{}", self.kind.key_prefix(), self.id, self.kind.extension())
    }
}
