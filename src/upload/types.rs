use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of the upload-destination request. Field casing follows the
/// object-storage gateway's contract.
#[derive(Debug, Serialize, Deserialize)]
pub struct RequestUploadBody {
    pub key: String,
    #[serde(rename = "ContentType")]
    pub content_type: String,
    #[serde(rename = "CacheControl")]
    pub cache_control: String,
    #[serde(rename = "Bucket")]
    pub bucket: String,
}

/// Body posted to the finish endpoint once the blob transfer completes.
#[derive(Debug, Serialize, Deserialize)]
pub struct FinishUploadBody {
    pub original_filename: String,
    pub asset_uuid: Uuid,
    pub media_type: String,
    pub extension: String,
    pub status: String,
    pub asset_type: String,
    pub workspace_uuid: String,
    pub width: u32,
    pub height: u32,
    /// Seconds, fixed to two decimals
    pub duration: String,
    pub capture_page_title: String,
    pub capture_page_url: String,
    pub capture_width: u32,
    pub capture_height: u32,
    pub capture_zoom: f64,
}
