use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::capture::{ArtifactKind, CapturedArtifact};
use crate::status::UploadStatus;

/// Bearer credentials for the remote asset API.
///
/// Set on sign-in, cleared on sign-out or on a 401 from any API call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub token: String,
    pub workspace_id: String,
}

/// Point-in-time view of the shared keys, for UI reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub recording: bool,
    pub upload_status: UploadStatus,
    pub resized: bool,
    pub signed_in: bool,
}

#[derive(Default)]
struct StoreInner {
    credentials: Option<CredentialRecord>,
    recording: bool,
    upload_status: UploadStatus,
    image_ref: Option<Arc<CapturedArtifact>>,
    video_ref: Option<Arc<CapturedArtifact>>,
    resized: bool,
}

/// Process-wide key-value state visible to every execution context.
///
/// Single writer per key: the coordinator owns `recording`, the upload
/// pipeline owns `upload_status` and the artifact references, the auth
/// handlers own `credentials` (with the API client clearing them on 401),
/// and the window handlers own `resized`. Anyone may read.
#[derive(Clone, Default)]
pub struct SharedStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl SharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_credentials(&self, credentials: CredentialRecord) {
        self.inner.write().await.credentials = Some(credentials);
    }

    pub async fn credentials(&self) -> Option<CredentialRecord> {
        self.inner.read().await.credentials.clone()
    }

    pub async fn clear_credentials(&self) {
        self.inner.write().await.credentials = None;
    }

    pub async fn set_recording(&self, recording: bool) {
        self.inner.write().await.recording = recording;
    }

    pub async fn recording(&self) -> bool {
        self.inner.read().await.recording
    }

    pub async fn set_upload_status(&self, status: UploadStatus) {
        self.inner.write().await.upload_status = status;
    }

    pub async fn upload_status(&self) -> UploadStatus {
        self.inner.read().await.upload_status
    }

    /// Keep the last artifact of its kind around for manual fallback
    /// download. Replaced per kind, cleared on reset.
    pub async fn set_artifact_ref(&self, artifact: Arc<CapturedArtifact>) {
        let mut inner = self.inner.write().await;
        match artifact.kind {
            ArtifactKind::Image => inner.image_ref = Some(artifact),
            ArtifactKind::Video => inner.video_ref = Some(artifact),
        }
    }

    pub async fn artifact_ref(&self, kind: ArtifactKind) -> Option<Arc<CapturedArtifact>> {
        let inner = self.inner.read().await;
        match kind {
            ArtifactKind::Image => inner.image_ref.clone(),
            ArtifactKind::Video => inner.video_ref.clone(),
        }
    }

    pub async fn clear_artifact_refs(&self) {
        let mut inner = self.inner.write().await;
        inner.image_ref = None;
        inner.video_ref = None;
    }

    pub async fn set_resized(&self, resized: bool) {
        self.inner.write().await.resized = resized;
    }

    pub async fn resized(&self) -> bool {
        self.inner.read().await.resized
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let inner = self.inner.read().await;
        StoreSnapshot {
            recording: inner.recording,
            upload_status: inner.upload_status,
            resized: inner.resized,
            signed_in: inner.credentials.is_some(),
        }
    }
}
