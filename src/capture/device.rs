use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Stream constraint set handed to the recorder device at start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConstraints {
    pub min_width: u32,
    pub max_width: u32,
    pub min_height: u32,
    pub max_height: u32,
    pub max_frame_rate: u32,
}

impl CaptureConstraints {
    /// Pin the stream to an exact resolution with a frame-rate ceiling.
    pub fn exact(width: u32, height: u32, max_frame_rate: u32) -> Self {
        Self {
            min_width: width,
            max_width: width,
            min_height: height,
            max_height: height,
            max_frame_rate,
        }
    }
}

/// A chunk of encoded media emitted by the device while capturing.
#[derive(Debug, Clone)]
pub struct MediaChunk {
    pub data: Vec<u8>,
    /// Milliseconds since the device started
    pub timestamp_ms: u64,
}

/// Audio capture is disabled for all recordings.
pub const AUDIO_BITS_PER_SECOND: u64 = 0;

/// Video bitrate selection: a monotonic step function over the standard
/// resolution ladder. Capture streams are tab-shaped rather than 16:9, so
/// class membership is keyed on the vertical resolution.
pub fn video_bitrate(_width: u32, height: u32) -> u64 {
    // 1080p (Full HD)
    if height <= 1080 {
        5_000_000
    }
    // 1440p (2K)
    else if height <= 1440 {
        10_000_000
    }
    // 2160p (4K)
    else if height <= 2160 {
        20_000_000
    }
    // 4320p (8K)
    else if height <= 4320 {
        50_000_000
    }
    // Anything taller than 8K
    else {
        100_000_000
    }
}

/// The opaque media-recording capability held by the capture surface.
///
/// Implementations own stream acquisition and encoding; the surface only
/// manages their lifecycle. A real implementation would sit inside a host
/// browser's capture context; the built-in synthetic device produces a
/// deterministic byte stream for the dev harness and tests.
#[async_trait::async_trait]
pub trait RecorderDevice: Send + Sync {
    /// Begin producing encoded chunks for the given stream.
    ///
    /// Returns a channel receiver. The device closes the channel when the
    /// stream ends, whether through an explicit stop or because the
    /// captured source went away.
    async fn start(
        &mut self,
        stream_id: &str,
        constraints: CaptureConstraints,
        video_bits_per_second: u64,
    ) -> Result<mpsc::Receiver<MediaChunk>>;

    /// Stop producing chunks and close the stream.
    async fn stop(&mut self) -> Result<()>;

    /// Check if the device is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get device name for logging
    fn name(&self) -> &str;
}

/// Factory resolving a configured backend name to a recorder device.
pub struct RecorderDeviceFactory;

impl RecorderDeviceFactory {
    pub fn create(backend: &str) -> Result<Box<dyn RecorderDevice>> {
        match backend {
            "synthetic" => Ok(Box::new(SyntheticDevice::new())),
            other => {
                anyhow::bail!("unknown recorder device backend: {}", other)
            }
        }
    }
}

/// Closure form of the factory, so callers can inject device construction.
pub type DeviceFactory = Arc<dyn Fn() -> Result<Box<dyn RecorderDevice>> + Send + Sync>;

/// Chunk-producing device with deterministic output.
///
/// Emits fixed-size chunks on an interval until stopped. With a chunk
/// limit set, the device closes its channel on its own after that many
/// chunks, which is how the captured-source-went-away path is exercised.
pub struct SyntheticDevice {
    capturing: Arc<AtomicBool>,
    chunk_limit: Option<usize>,
    chunk_interval: Duration,
}

impl SyntheticDevice {
    pub fn new() -> Self {
        Self {
            capturing: Arc::new(AtomicBool::new(false)),
            chunk_limit: None,
            chunk_interval: Duration::from_millis(50),
        }
    }

    /// Close the stream after `limit` chunks without waiting for a stop.
    pub fn with_chunk_limit(limit: usize) -> Self {
        Self {
            chunk_limit: Some(limit),
            ..Self::new()
        }
    }
}

impl Default for SyntheticDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RecorderDevice for SyntheticDevice {
    async fn start(
        &mut self,
        stream_id: &str,
        constraints: CaptureConstraints,
        video_bits_per_second: u64,
    ) -> Result<mpsc::Receiver<MediaChunk>> {
        if self.capturing.swap(true, Ordering::SeqCst) {
            anyhow::bail!("synthetic device is already capturing");
        }

        info!(
            "Synthetic device started: stream={} {}x{} @{}bps",
            stream_id, constraints.max_width, constraints.max_height, video_bits_per_second
        );

        let (tx, rx) = mpsc::channel(64);
        let capturing = Arc::clone(&self.capturing);
        let chunk_limit = self.chunk_limit;
        let interval_ms = self.chunk_interval.as_millis() as u64;
        let mut ticker = tokio::time::interval(self.chunk_interval);

        tokio::spawn(async move {
            let mut seq: u64 = 0;

            loop {
                ticker.tick().await;

                if !capturing.load(Ordering::SeqCst) {
                    break;
                }

                if let Some(limit) = chunk_limit {
                    if seq as usize >= limit {
                        // Source gone: close the channel without a stop
                        capturing.store(false, Ordering::SeqCst);
                        break;
                    }
                }

                let chunk = MediaChunk {
                    data: vec![(seq % 251) as u8; 4096],
                    timestamp_ms: seq * interval_ms,
                };

                if tx.send(chunk).await.is_err() {
                    break;
                }

                seq += 1;
            }
            // Sender drops here; the consumer sees end-of-stream
        });

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if !self.capturing.swap(false, Ordering::SeqCst) {
            warn!("Synthetic device stop while not capturing");
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}
