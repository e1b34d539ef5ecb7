use anyhow::{Context, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Descriptive metadata of a browser tab.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: u64,
    pub title: String,
    pub url: String,
    /// Visible width in CSS pixels; zero while the tab is not ready
    pub width: u32,
    /// Visible height in CSS pixels; zero while the tab is not ready
    pub height: u32,
}

/// Inner/outer dimensions of the active browser window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WindowMetrics {
    pub inner_width: u32,
    pub inner_height: u32,
    pub outer_width: u32,
    pub outer_height: u32,
}

/// A visible-tab frame grab, delivered as a data URL the way host browsers
/// hand them out.
#[derive(Debug, Clone)]
pub struct FrameGrab {
    pub data_url: String,
    pub width: u32,
    pub height: u32,
}

/// The host browser capability: tab and window queries, stream id
/// acquisition, page zoom, visible-tab grabs.
///
/// A real implementation lives in a host browser integration. The fixture
/// implementation below serves the dev harness and tests.
#[async_trait::async_trait]
pub trait BrowserHost: Send + Sync {
    /// The active tab of the current window.
    async fn active_tab(&self) -> Result<TabInfo>;

    /// Acquire a capture stream correlation id for the given tab.
    async fn media_stream_id(&self, tab_id: u64) -> Result<String>;

    /// Page zoom factor of the given tab, as a percentage.
    async fn page_zoom(&self, tab_id: u64) -> Result<f64>;

    /// Inner/outer dimensions of the active window.
    async fn window_metrics(&self) -> Result<WindowMetrics>;

    /// Grab the visible area of the active tab as a JPEG data URL.
    async fn grab_visible_tab(&self) -> Result<FrameGrab>;

    /// Get host name for logging
    fn name(&self) -> &str;
}

/// Decode the payload of a base64 data URL.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>> {
    let (_, payload) = data_url
        .split_once(";base64,")
        .context("not a base64 data URL")?;

    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .context("invalid base64 payload in data URL")
}

/// Fixture host with fixed tab geometry.
pub struct FixtureBrowser {
    tab: TabInfo,
    zoom: f64,
    frame_bytes: Vec<u8>,
    stream_seq: std::sync::atomic::AtomicU64,
}

impl FixtureBrowser {
    pub fn new() -> Self {
        Self::with_tab(TabInfo {
            id: 1,
            title: "Fixture Tab".to_string(),
            url: "https://example.com/".to_string(),
            width: 1280,
            height: 720,
        })
    }

    pub fn with_tab(tab: TabInfo) -> Self {
        Self {
            tab,
            zoom: 100.0,
            frame_bytes: vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46],
            stream_seq: std::sync::atomic::AtomicU64::new(0),
        }
    }

    pub fn zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn frame_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.frame_bytes = bytes;
        self
    }
}

impl Default for FixtureBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BrowserHost for FixtureBrowser {
    async fn active_tab(&self) -> Result<TabInfo> {
        Ok(self.tab.clone())
    }

    async fn media_stream_id(&self, tab_id: u64) -> Result<String> {
        // Fresh correlation id per acquisition, like a real host
        let seq = self
            .stream_seq
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(format!("fixture-stream-{}-{}", tab_id, seq))
    }

    async fn page_zoom(&self, _tab_id: u64) -> Result<f64> {
        Ok(self.zoom)
    }

    async fn window_metrics(&self) -> Result<WindowMetrics> {
        Ok(WindowMetrics {
            inner_width: self.tab.width,
            inner_height: self.tab.height,
            outer_width: self.tab.width + 16,
            outer_height: self.tab.height + 88,
        })
    }

    async fn grab_visible_tab(&self) -> Result<FrameGrab> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.frame_bytes);
        Ok(FrameGrab {
            data_url: format!("data:image/jpeg;base64,{}", encoded),
            width: self.tab.width,
            height: self.tab.height,
        })
    }

    fn name(&self) -> &str {
        "fixture"
    }
}
