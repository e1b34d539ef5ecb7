use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub api: ApiConfig,
    pub capture: CaptureConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the remote asset API
    pub base_url: String,
    /// Object-storage bucket named in upload-destination requests
    pub bucket: String,
    /// Value sent in the X-Requested-With client identification header
    pub client_tag: String,
    /// Request timeout in seconds for upload calls
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    /// Recorder device backend ("synthetic" is the only built-in)
    pub backend: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
