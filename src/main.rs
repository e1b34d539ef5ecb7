use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tabcast::capture::{DeviceFactory, RecorderDeviceFactory};
use tabcast::{
    create_router, AppState, Config, FixtureBrowser, RecordingCoordinator, SharedStore,
    StatusBroadcaster, UploadPipeline,
};
use tracing::info;

#[derive(Parser)]
#[command(name = "tabcast", about = "Tab capture and upload agent")]
struct Args {
    /// Path to the configuration file (without extension)
    #[arg(short, long, default_value = "config/tabcast")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("tabcast v0.1.0");
    info!("Loaded config: {}", cfg.service.name);

    let store = SharedStore::new();
    let status = StatusBroadcaster::default();

    let api = tabcast::ApiClient::new(cfg.api.clone(), store.clone())?;
    let uploads = UploadPipeline::new(api, store.clone(), status.clone()).spawn();

    let backend = cfg.capture.backend.clone();
    let device_factory: DeviceFactory = Arc::new(move || RecorderDeviceFactory::create(&backend));

    let coordinator = RecordingCoordinator::new(
        Arc::new(FixtureBrowser::new()),
        device_factory,
        store.clone(),
        status.clone(),
        uploads,
    );

    let state = AppState {
        coordinator,
        store,
        status,
    };

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP control surface listening on {}", addr);

    axum::serve(listener, create_router(state))
        .await
        .context("HTTP server failed")?;

    Ok(())
}
