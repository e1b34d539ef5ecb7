pub mod browser;
pub mod capture;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod status;
pub mod store;
pub mod upload;

pub use browser::{BrowserHost, FixtureBrowser, FrameGrab, TabInfo, WindowMetrics};
pub use capture::{
    ArtifactKind, ArtifactMetadata, CaptureConstraints, CaptureSurface, CapturedArtifact,
    DeviceFactory, FinishedCapture, MediaChunk, RecorderDevice, RecorderDeviceFactory,
    SyntheticDevice,
};
pub use config::Config;
pub use error::CoordinatorError;
pub use http::{create_router, AppState};
pub use session::{RecorderStatus, RecordingCoordinator, RecordingSession};
pub use status::{RecorderSignal, StatusBroadcaster, StatusEvent, UploadStatus};
pub use store::{CredentialRecord, SharedStore, StoreSnapshot};
pub use upload::{ApiClient, UploadPipeline, UploadQueue};
