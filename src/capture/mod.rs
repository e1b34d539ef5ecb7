pub mod artifact;
pub mod device;
pub mod surface;

pub use artifact::{ArtifactKind, ArtifactMetadata, CapturedArtifact};
pub use device::{
    video_bitrate, CaptureConstraints, DeviceFactory, MediaChunk, RecorderDevice,
    RecorderDeviceFactory, SyntheticDevice, AUDIO_BITS_PER_SECOND,
};
pub use surface::{CaptureSurface, FinishedCapture};
