use anyhow::{Context, Result};
use reqwest::header;
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use tracing::warn;

use super::types::{FinishUploadBody, RequestUploadBody};
use crate::config::ApiConfig;
use crate::store::{CredentialRecord, SharedStore};

/// Typed client for the remote asset API.
///
/// All calls carry the bearer credential and the client identification
/// header. A 401 on any call clears the stored credential; the failing
/// call surfaces its own error and UI re-checks credentials on its next
/// interaction.
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
    store: SharedStore,
}

impl ApiClient {
    pub fn new(config: ApiConfig, store: SharedStore) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            config,
            store,
        })
    }

    async fn credentials(&self) -> Result<CredentialRecord> {
        self.store
            .credentials()
            .await
            .context("no stored credentials; sign in first")
    }

    /// Request a write destination for the given object key. The API
    /// returns the destination URL as plain text.
    pub async fn request_upload(&self, key: &str, content_type: &str) -> Result<String> {
        let credentials = self.credentials().await?;
        let url = format!("{}/request-upload", self.config.base_url);

        let body = RequestUploadBody {
            key: key.to_string(),
            content_type: content_type.to_string(),
            cache_control: "no-store".to_string(),
            bucket: self.config.bucket.clone(),
        };

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .header("X-Requested-With", &self.config.client_tag)
            .bearer_auth(&credentials.token)
            .json(&body)
            .send()
            .await
            .context("Failed to request upload destination")?;

        let response = self.checked(response).await?;

        response
            .text()
            .await
            .context("Failed to read destination URL")
    }

    /// Direct write of the raw payload to the issued destination. No
    /// retries at this layer.
    pub async fn put_blob(&self, destination: &str, content_type: &str, payload: Vec<u8>) -> Result<()> {
        let response = self
            .client
            .put(destination)
            .header(header::CONTENT_TYPE, content_type)
            .body(payload)
            .send()
            .await
            .context("Failed to transfer payload")?;

        if !response.status().is_success() {
            anyhow::bail!("destination returned status {}", response.status());
        }

        Ok(())
    }

    /// Post artifact metadata to the finish endpoint.
    pub async fn finish(&self, body: &FinishUploadBody) -> Result<()> {
        let credentials = self.credentials().await?;
        let url = format!("{}/finish?upload_complete=true", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .header("X-Requested-With", &self.config.client_tag)
            .bearer_auth(&credentials.token)
            .json(body)
            .send()
            .await
            .context("Failed to post finish record")?;

        self.checked(response).await?;

        Ok(())
    }

    async fn checked(&self, response: Response) -> Result<Response> {
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!("API returned 401; clearing stored credentials");
            self.store.clear_credentials().await;
            anyhow::bail!("authentication expired");
        }

        if !response.status().is_success() {
            anyhow::bail!("API returned status {}", response.status());
        }

        Ok(response)
    }
}
