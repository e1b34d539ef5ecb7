use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::device::{video_bitrate, CaptureConstraints, RecorderDevice, AUDIO_BITS_PER_SECOND};

/// Event emitted when a recording finalizes: the accumulated payload plus
/// the device-side start/end instants, from which duration derives.
#[derive(Debug)]
pub struct FinishedCapture {
    pub stream_id: String,
    pub payload: Vec<u8>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// The capture surface: owns the live recorder device handle and the chunk
/// pump for the at-most-one active recording.
///
/// Provisioned by the coordinator (at most one exists at a time) and torn
/// down on reset. Finished artifacts flow out on the events channel, so a
/// recording that ends on its own (the captured source going away) takes
/// the same finalize path as an explicit stop and is never lost.
pub struct CaptureSurface {
    device: Box<dyn RecorderDevice>,
    events_tx: mpsc::Sender<FinishedCapture>,
    active: Option<ActiveCapture>,
}

struct ActiveCapture {
    stream_id: String,
    pump: JoinHandle<()>,
}

impl CaptureSurface {
    pub fn new(device: Box<dyn RecorderDevice>, events_tx: mpsc::Sender<FinishedCapture>) -> Self {
        info!("Capture surface provisioned (device: {})", device.name());
        Self {
            device,
            events_tx,
            active: None,
        }
    }

    /// Start recording the given stream under the given constraints.
    ///
    /// Calling this while a capture is live is a programming error in the
    /// caller, not a recoverable condition: the surface guarantees at most
    /// one active recording.
    pub async fn start_capture(
        &mut self,
        stream_id: String,
        constraints: CaptureConstraints,
    ) -> Result<()> {
        assert!(
            !self.has_live_capture(),
            "start_capture called while a capture is in progress"
        );

        let bitrate = video_bitrate(constraints.max_width, constraints.max_height);
        let mut chunks = self
            .device
            .start(&stream_id, constraints, bitrate)
            .await
            .context("Failed to start recorder device")?;

        info!(
            "Capture started: stream={} {}x{} video={}bps audio={}bps",
            stream_id,
            constraints.max_width,
            constraints.max_height,
            bitrate,
            AUDIO_BITS_PER_SECOND
        );

        let started_at = Utc::now();
        let events_tx = self.events_tx.clone();
        let pump_stream_id = stream_id.clone();

        // Accumulate chunks in arrival order; finalize when the device
        // closes the channel, whatever the reason it closed.
        let pump = tokio::spawn(async move {
            let mut parts: Vec<Vec<u8>> = Vec::new();

            while let Some(chunk) = chunks.recv().await {
                parts.push(chunk.data);
            }

            let ended_at = Utc::now();
            let payload = parts.concat();

            info!(
                "Capture finalized: stream={} ({} bytes)",
                pump_stream_id,
                payload.len()
            );

            let finished = FinishedCapture {
                stream_id: pump_stream_id,
                payload,
                started_at,
                ended_at,
            };

            if events_tx.send(finished).await.is_err() {
                error!("No listener for finished capture; artifact dropped");
            }
        });

        self.active = Some(ActiveCapture { stream_id, pump });

        Ok(())
    }

    /// Stop the live capture and wait for the pump to finalize.
    ///
    /// The finished-artifact event is emitted before this returns; callers
    /// consume it from the events channel, not from this call.
    pub async fn stop_capture(&mut self) -> Result<()> {
        let Some(active) = self.active.take() else {
            return Ok(());
        };

        info!("Stopping capture: stream={}", active.stream_id);

        self.device
            .stop()
            .await
            .context("Failed to stop recorder device")?;

        if let Err(e) = active.pump.await {
            error!("Capture pump panicked: {}", e);
        }

        Ok(())
    }

    /// Whether a capture is live right now. A pump that already finalized
    /// (source went away) no longer counts.
    pub fn has_live_capture(&self) -> bool {
        self.active
            .as_ref()
            .map(|active| !active.pump.is_finished())
            .unwrap_or(false)
    }
}
