use anyhow::Context;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::state::{RecorderStatus, RecordingSession};
use crate::browser::{decode_data_url, BrowserHost, WindowMetrics};
use crate::capture::{
    ArtifactKind, ArtifactMetadata, CaptureConstraints, CaptureSurface, CapturedArtifact,
    DeviceFactory, FinishedCapture,
};
use crate::error::CoordinatorError;
use crate::status::StatusEvent;
use crate::store::SharedStore;
use crate::upload::UploadQueue;

/// Capture resolution is 2x the visible tab size.
pub const CAPTURE_SCALE: u32 = 2;

/// Frame-rate ceiling for all recordings.
pub const MAX_FRAME_RATE: u32 = 30;

struct CoordinatorState {
    status: RecorderStatus,
    session: RecordingSession,
}

/// The recording state machine.
///
/// Owns the session lifecycle, provisions and drives the capture surface,
/// and hands finished artifacts to the upload pipeline. Lives in the
/// long-lived context so transient UI surfaces can come and go without
/// interrupting capture or losing artifacts.
pub struct RecordingCoordinator {
    browser: Arc<dyn BrowserHost>,
    device_factory: DeviceFactory,
    store: SharedStore,
    status: crate::status::StatusBroadcaster,
    uploads: UploadQueue,
    state: Mutex<CoordinatorState>,
    surface: Mutex<Option<CaptureSurface>>,
    /// Metadata snapshots for in-flight captures, keyed by stream id and
    /// taken at start. They survive reset so an artifact arriving
    /// afterwards still uploads correctly.
    pending: Mutex<HashMap<String, ArtifactMetadata>>,
    events_tx: mpsc::Sender<FinishedCapture>,
}

impl RecordingCoordinator {
    pub fn new(
        browser: Arc<dyn BrowserHost>,
        device_factory: DeviceFactory,
        store: SharedStore,
        status: crate::status::StatusBroadcaster,
        uploads: UploadQueue,
    ) -> Arc<Self> {
        let (events_tx, mut events_rx) = mpsc::channel::<FinishedCapture>(16);

        let coordinator = Arc::new(Self {
            browser,
            device_factory,
            store,
            status,
            uploads,
            state: Mutex::new(CoordinatorState {
                status: RecorderStatus::Idle,
                session: RecordingSession::default(),
            }),
            surface: Mutex::new(None),
            pending: Mutex::new(HashMap::new()),
            events_tx,
        });

        // Artifact listener: finished captures flow here regardless of
        // what the state machine has done since.
        let listener = Arc::clone(&coordinator);
        tokio::spawn(async move {
            while let Some(finished) = events_rx.recv().await {
                listener.handle_finished(finished).await;
            }
        });

        coordinator
    }

    /// Start a recording session against the active tab.
    pub async fn start(&self) -> Result<(), CoordinatorError> {
        {
            let mut state = self.state.lock().await;
            if state.status != RecorderStatus::Idle {
                return Err(CoordinatorError::InvalidState(format!(
                    "can't start recording while recorder status is {:?}",
                    state.status
                )));
            }
            state.session.clear();
            state.status = RecorderStatus::Provisioning;
        }

        match self.begin_capture().await {
            Ok(()) => Ok(()),
            Err(e) => {
                // Failure edge: back to Idle, no partial session state
                let mut state = self.state.lock().await;
                state.status = RecorderStatus::Idle;
                state.session.clear();
                Err(e)
            }
        }
    }

    async fn begin_capture(&self) -> Result<(), CoordinatorError> {
        let tab = self
            .browser
            .active_tab()
            .await
            .map_err(|e| CoordinatorError::CaptureUnavailable(e.to_string()))?;

        if tab.width == 0 || tab.height == 0 {
            return Err(CoordinatorError::CaptureUnavailable(
                "tab is not ready".to_string(),
            ));
        }

        let zoom = self.browser.page_zoom(tab.id).await.unwrap_or(-1.0);

        self.ensure_surface()
            .await
            .map_err(|e| CoordinatorError::CaptureUnavailable(e.to_string()))?;

        let stream_id = self
            .browser
            .media_stream_id(tab.id)
            .await
            .map_err(|e| CoordinatorError::CaptureUnavailable(e.to_string()))?;

        let width = tab.width * CAPTURE_SCALE;
        let height = tab.height * CAPTURE_SCALE;
        let constraints = CaptureConstraints::exact(width, height, MAX_FRAME_RATE);

        {
            let mut surface = self.surface.lock().await;
            let surface = surface.as_mut().expect("capture surface provisioned above");
            surface
                .start_capture(stream_id.clone(), constraints)
                .await
                .map_err(|e| CoordinatorError::CaptureUnavailable(e.to_string()))?;
        }

        {
            let mut state = self.state.lock().await;
            state.session = RecordingSession {
                session_id: Some(Uuid::new_v4()),
                source_tab_id: Some(tab.id),
                source_title: tab.title,
                source_url: tab.url,
                width,
                height,
                zoom,
                stream_id: stream_id.clone(),
                started_at: Some(Utc::now()),
                ended_at: None,
            };
            state.status = RecorderStatus::Recording;
            self.pending
                .lock()
                .await
                .insert(stream_id, state.session.artifact_metadata());
        }

        self.store.set_recording(true).await;
        self.status
            .publish(StatusEvent::Recorder(RecorderStatus::Recording.signal()));

        info!("Recording started ({}x{} @{}fps max)", width, height, MAX_FRAME_RATE);

        Ok(())
    }

    /// Stop the in-progress recording. The artifact arrives asynchronously
    /// through the capture surface's completion event.
    pub async fn stop(&self) -> Result<(), CoordinatorError> {
        {
            let mut state = self.state.lock().await;
            if state.status != RecorderStatus::Recording {
                return Err(CoordinatorError::InvalidState(format!(
                    "can't stop recording while recorder status is {:?}",
                    state.status
                )));
            }
            state.status = RecorderStatus::Stopping;
            state.session.ended_at = Some(Utc::now());
        }

        self.store.set_recording(false).await;

        let result = {
            let mut surface = self.surface.lock().await;
            match surface.as_mut() {
                Some(surface) => surface.stop_capture().await,
                None => Ok(()),
            }
        };

        self.state.lock().await.status = RecorderStatus::Idle;
        self.status
            .publish(StatusEvent::Recorder(RecorderStatus::Idle.signal()));

        result.map_err(|e| CoordinatorError::CaptureUnavailable(e.to_string()))?;

        info!("Recording stopped");

        Ok(())
    }

    /// Capture the visible tab as a JPEG and queue it for upload.
    pub async fn take_screenshot(&self) -> Result<(), CoordinatorError> {
        let tab = self
            .browser
            .active_tab()
            .await
            .map_err(|e| CoordinatorError::CaptureUnavailable(e.to_string()))?;

        if tab.width == 0 || tab.height == 0 {
            return Err(CoordinatorError::CaptureUnavailable(
                "tab is not ready".to_string(),
            ));
        }

        let zoom = self.browser.page_zoom(tab.id).await.unwrap_or(-1.0);

        let frame = self
            .browser
            .grab_visible_tab()
            .await
            .map_err(|e| CoordinatorError::CaptureUnavailable(e.to_string()))?;

        let payload = decode_data_url(&frame.data_url)
            .map_err(|e| CoordinatorError::CaptureUnavailable(e.to_string()))?;

        let metadata = ArtifactMetadata {
            width: frame.width,
            height: frame.height,
            duration_secs: 0.0,
            page_title: tab.title,
            page_url: tab.url,
            zoom,
        };

        let artifact = CapturedArtifact::new(ArtifactKind::Image, payload, metadata);

        info!("Screenshot captured ({}x{})", frame.width, frame.height);

        self.uploads.enqueue(Arc::new(artifact)).await;

        Ok(())
    }

    /// Clear all session state and tear down the capture surface.
    /// Idempotent.
    pub async fn reset_state(&self) {
        {
            let mut state = self.state.lock().await;
            state.status = RecorderStatus::Idle;
            state.session.clear();
        }

        let surface = self.surface.lock().await.take();
        if let Some(mut surface) = surface {
            if let Err(e) = surface.stop_capture().await {
                warn!("Failed to stop capture during reset: {}", e);
            }
        }

        self.store.set_recording(false).await;
        self.store.clear_artifact_refs().await;
        self.uploads.publish_idle().await;

        info!("Capture state reset");
    }

    /// Current machine state, for UI reconciliation.
    pub async fn query_status(&self) -> RecorderStatus {
        self.state.lock().await.status
    }

    /// Copy of the current session fields.
    pub async fn session_snapshot(&self) -> RecordingSession {
        self.state.lock().await.session.clone()
    }

    /// Inner/outer window dimensions passthrough.
    pub async fn window_metrics(&self) -> Result<WindowMetrics, CoordinatorError> {
        self.browser
            .window_metrics()
            .await
            .map_err(|e| CoordinatorError::CaptureUnavailable(e.to_string()))
    }

    /// Provision the capture surface if none exists. Concurrent callers
    /// serialize here and share the one provisioned surface.
    async fn ensure_surface(&self) -> anyhow::Result<()> {
        let mut surface = self.surface.lock().await;
        if surface.is_none() {
            let device = (self.device_factory)().context("Failed to create recorder device")?;
            *surface = Some(CaptureSurface::new(device, self.events_tx.clone()));
        }
        Ok(())
    }

    /// A finished capture arrived from the surface. Merge it with the
    /// session metadata snapshot and queue the upload, whatever the state
    /// machine looks like by now.
    async fn handle_finished(&self, finished: FinishedCapture) {
        let metadata = self.pending.lock().await.remove(&finished.stream_id);
        let mut metadata = match metadata {
            Some(metadata) => metadata,
            None => {
                error!(
                    "Finished capture {} has no metadata snapshot; uploading bare",
                    finished.stream_id
                );
                ArtifactMetadata::default()
            }
        };

        let elapsed = finished.ended_at - finished.started_at;
        metadata.duration_secs = elapsed.num_milliseconds() as f64 / 1000.0;

        // The captured source going away ends the recording without a stop
        // command; reconcile the machine so the next start is possible.
        {
            let mut state = self.state.lock().await;
            if state.status == RecorderStatus::Recording {
                warn!("Capture ended on its own (stream {})", finished.stream_id);
                state.status = RecorderStatus::Idle;
                state.session.ended_at = Some(finished.ended_at);
                drop(state);
                self.store.set_recording(false).await;
                self.status
                    .publish(StatusEvent::Recorder(RecorderStatus::Idle.signal()));
            }
        }

        let artifact = CapturedArtifact::new(ArtifactKind::Video, finished.payload, metadata);

        info!(
            "Artifact ready: {} ({:.2}s, {} bytes)",
            artifact.id,
            artifact.metadata.duration_secs,
            artifact.payload.len()
        );

        self.uploads.enqueue(Arc::new(artifact)).await;
    }
}
