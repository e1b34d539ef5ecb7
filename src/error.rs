use serde::Serialize;

/// Errors surfaced by the recording coordinator and upload pipeline.
///
/// These are result values, not panics: a caller issuing a command in the
/// wrong state gets a diagnostic back and the coordinator keeps running.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("capture unavailable: {0}")]
    CaptureUnavailable(String),

    #[error("upload transport failed: {0}")]
    UploadTransport(String),

    #[error("authentication expired")]
    AuthExpired,
}

impl Serialize for CoordinatorError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
