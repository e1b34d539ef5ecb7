use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

use super::api::ApiClient;
use super::types::FinishUploadBody;
use crate::capture::CapturedArtifact;
use crate::status::{StatusBroadcaster, StatusEvent, UploadStatus};
use crate::store::SharedStore;

/// Asset type recorded on every finished upload.
const ASSET_TYPE: &str = "tabcast";

/// Sequential upload pipeline: request a destination, transfer the blob,
/// finalize the remote record.
///
/// Every attempt ends in a terminal broadcast, `Success` or `Error`,
/// never a stuck `Uploading`. Failures are terminal per attempt: no
/// automatic retries, and the artifact reference stays in the store for a
/// manual fallback download.
pub struct UploadPipeline {
    api: ApiClient,
    store: SharedStore,
    status: StatusBroadcaster,
}

/// Handle to the spawned pipeline worker. Artifacts enqueue here and
/// upload one at a time, so at most one upload is ever active.
#[derive(Clone)]
pub struct UploadQueue {
    tx: mpsc::Sender<Arc<CapturedArtifact>>,
    store: SharedStore,
    status: StatusBroadcaster,
}

impl UploadPipeline {
    pub fn new(api: ApiClient, store: SharedStore, status: StatusBroadcaster) -> Self {
        Self { api, store, status }
    }

    /// Spawn the worker task and return its queue handle.
    pub fn spawn(self) -> UploadQueue {
        let (tx, mut rx) = mpsc::channel::<Arc<CapturedArtifact>>(8);
        let queue = UploadQueue {
            tx,
            store: self.store.clone(),
            status: self.status.clone(),
        };

        tokio::spawn(async move {
            while let Some(artifact) = rx.recv().await {
                self.upload(artifact).await;
            }
        });

        queue
    }

    /// Run one upload attempt through to a terminal status.
    pub async fn upload(&self, artifact: Arc<CapturedArtifact>) {
        self.publish(UploadStatus::Uploading).await;
        // Manual-download fallback reference, kept on failure too
        self.store.set_artifact_ref(Arc::clone(&artifact)).await;

        info!(
            "Uploading {} artifact {} ({} bytes)",
            artifact.kind.media_type(),
            artifact.id,
            artifact.payload.len()
        );

        match self.transfer(&artifact).await {
            Ok(()) => {
                info!("Upload complete: {}", artifact.id);
                self.publish(UploadStatus::Success).await;
            }
            Err(e) => {
                error!("Upload failed for {}: {:#}", artifact.id, e);
                self.publish(UploadStatus::Error).await;
            }
        }
    }

    async fn transfer(&self, artifact: &CapturedArtifact) -> Result<()> {
        let key = artifact.storage_key();
        let content_type = artifact.kind.content_type();

        let destination = self.api.request_upload(&key, content_type).await?;

        self.api
            .put_blob(&destination, content_type, artifact.payload.clone())
            .await?;

        let credentials = self
            .store
            .credentials()
            .await
            .context("no stored credentials; sign in first")?;

        let body = FinishUploadBody {
            original_filename: format!(
                "{}-{}.{}",
                Utc::now().timestamp_millis(),
                artifact.kind.filename_stem(),
                artifact.kind.extension()
            ),
            asset_uuid: artifact.id,
            media_type: artifact.kind.media_type().to_string(),
            extension: artifact.kind.extension().to_string(),
            status: artifact.kind.finish_status().to_string(),
            asset_type: ASSET_TYPE.to_string(),
            workspace_uuid: credentials.workspace_id,
            width: artifact.metadata.width,
            height: artifact.metadata.height,
            duration: format!("{:.2}", artifact.metadata.duration_secs),
            capture_page_title: artifact.metadata.page_title.clone(),
            capture_page_url: artifact.metadata.page_url.clone(),
            capture_width: artifact.metadata.width,
            capture_height: artifact.metadata.height,
            capture_zoom: artifact.metadata.zoom,
        };

        self.api.finish(&body).await
    }

    async fn publish(&self, status: UploadStatus) {
        self.store.set_upload_status(status).await;
        self.status.publish(StatusEvent::Upload(status));
    }
}

impl UploadQueue {
    /// Queue an artifact for upload. Uploads serialize in arrival order.
    pub async fn enqueue(&self, artifact: Arc<CapturedArtifact>) {
        if self.tx.send(artifact).await.is_err() {
            error!("Upload worker is gone; artifact dropped");
        }
    }

    /// Return the published upload status to Idle (used on capture reset).
    pub async fn publish_idle(&self) {
        self.store.set_upload_status(UploadStatus::Idle).await;
        self.status.publish(StatusEvent::Upload(UploadStatus::Idle));
    }
}
