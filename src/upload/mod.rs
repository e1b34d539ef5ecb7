//! Upload pipeline
//!
//! Takes a captured artifact plus its session metadata, requests a remote
//! write destination, transfers the blob, and finalizes the remote record,
//! publishing status transitions along the way.

mod api;
mod pipeline;
mod types;

pub use api::ApiClient;
pub use pipeline::{UploadPipeline, UploadQueue};
pub use types::{FinishUploadBody, RequestUploadBody};
