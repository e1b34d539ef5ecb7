// Integration tests for the upload pipeline.
//
// A real axum server bound to 127.0.0.1:0 stands in for the remote asset
// API, so every test exercises the actual wire path: destination request,
// blob transfer, finalize. Failure injection at each step verifies that
// the pipeline always reaches a terminal status.

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{post, put};
use axum::{Json, Router};
use std::sync::Arc;
use std::time::Duration;
use tabcast::capture::{ArtifactKind, ArtifactMetadata, CapturedArtifact};
use tabcast::config::ApiConfig;
use tabcast::upload::{FinishUploadBody, RequestUploadBody};
use tabcast::{
    ApiClient, CredentialRecord, SharedStore, StatusBroadcaster, StatusEvent, UploadPipeline,
    UploadStatus,
};
use tokio::sync::{broadcast, Mutex};

#[derive(Default)]
struct FakeApiState {
    base_url: String,
    fail_destination: bool,
    fail_transfer: bool,
    fail_finish: bool,
    unauthorized: bool,
    destination_requests: Vec<RequestUploadBody>,
    bearer_tokens: Vec<String>,
    client_tags: Vec<String>,
    blobs: Vec<(String, Vec<u8>)>,
    finishes: Vec<FinishUploadBody>,
}

#[derive(Clone, Default)]
struct FakeApi {
    state: Arc<Mutex<FakeApiState>>,
}

async fn handle_request_upload(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    Json(body): Json<RequestUploadBody>,
) -> impl IntoResponse {
    let mut state = api.state.lock().await;

    if state.unauthorized {
        return (StatusCode::UNAUTHORIZED, String::new());
    }
    if state.fail_destination {
        return (StatusCode::INTERNAL_SERVER_ERROR, String::new());
    }

    if let Some(auth) = headers.get("authorization") {
        state.bearer_tokens.push(auth.to_str().unwrap().to_string());
    }
    if let Some(tag) = headers.get("x-requested-with") {
        state.client_tags.push(tag.to_str().unwrap().to_string());
    }

    state.destination_requests.push(body);
    let destination = format!("{}/blob", state.base_url);

    (StatusCode::OK, destination)
}

async fn handle_put_blob(
    State(api): State<FakeApi>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let mut state = api.state.lock().await;

    if state.fail_transfer {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }

    let content_type = headers
        .get("content-type")
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    state.blobs.push((content_type, body.to_vec()));

    StatusCode::OK
}

async fn handle_finish(
    State(api): State<FakeApi>,
    Json(body): Json<FinishUploadBody>,
) -> impl IntoResponse {
    let mut state = api.state.lock().await;

    if state.unauthorized {
        return StatusCode::UNAUTHORIZED;
    }
    if state.fail_finish {
        return StatusCode::INTERNAL_SERVER_ERROR;
    }

    state.finishes.push(body);

    StatusCode::OK
}

/// Serve the fake API on an ephemeral port and return it with its base URL.
async fn serve_fake_api() -> (FakeApi, String) {
    let api = FakeApi::default();

    let app = Router::new()
        .route("/request-upload", post(handle_request_upload))
        .route("/blob", put(handle_put_blob))
        .route("/finish", post(handle_finish))
        .with_state(api.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    api.state.lock().await.base_url = base_url.clone();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (api, base_url)
}

fn api_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        base_url: base_url.to_string(),
        bucket: "media".to_string(),
        client_tag: "TabcastTest".to_string(),
        timeout_secs: 5,
    }
}

fn video_artifact() -> CapturedArtifact {
    CapturedArtifact::new(
        ArtifactKind::Video,
        vec![7u8; 2048],
        ArtifactMetadata {
            width: 2560,
            height: 1440,
            duration_secs: 2.5,
            page_title: "Release notes".to_string(),
            page_url: "https://example.com/notes".to_string(),
            zoom: 100.0,
        },
    )
}

async fn signed_in_store() -> SharedStore {
    let store = SharedStore::new();
    store
        .set_credentials(CredentialRecord {
            token: "token-123".to_string(),
            workspace_id: "ws-456".to_string(),
        })
        .await;
    store
}

async fn next_upload_status(rx: &mut broadcast::Receiver<StatusEvent>) -> UploadStatus {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for status event")
            .expect("status channel closed");

        if let StatusEvent::Upload(status) = event {
            return status;
        }
    }
}

#[tokio::test]
async fn test_successful_upload_publishes_success() -> Result<()> {
    let (api, base_url) = serve_fake_api().await;
    let store = signed_in_store().await;
    let status = StatusBroadcaster::default();
    let mut events = status.subscribe();

    let client = ApiClient::new(api_config(&base_url), store.clone())?;
    let pipeline = UploadPipeline::new(client, store.clone(), status.clone());

    let artifact = Arc::new(video_artifact());
    pipeline.upload(Arc::clone(&artifact)).await;

    assert_eq!(next_upload_status(&mut events).await, UploadStatus::Uploading);
    assert_eq!(next_upload_status(&mut events).await, UploadStatus::Success);
    assert_eq!(store.upload_status().await, UploadStatus::Success);

    let state = api.state.lock().await;

    // Destination request: kind-namespaced key and wire headers
    assert_eq!(state.destination_requests.len(), 1);
    let request = &state.destination_requests[0];
    assert_eq!(request.key, format!("videos_raw/{}.webm", artifact.id));
    assert_eq!(request.content_type, "video/webm");
    assert_eq!(request.cache_control, "no-store");
    assert_eq!(request.bucket, "media");
    assert_eq!(state.bearer_tokens[0], "Bearer token-123");
    assert_eq!(state.client_tags[0], "TabcastTest");

    // Blob transfer: raw payload, matching content type
    assert_eq!(state.blobs.len(), 1);
    assert_eq!(state.blobs[0].0, "video/webm");
    assert_eq!(state.blobs[0].1, artifact.payload);

    // Finalize: metadata equals the snapshot carried by the artifact
    assert_eq!(state.finishes.len(), 1);
    let finish = &state.finishes[0];
    assert_eq!(finish.asset_uuid, artifact.id);
    assert_eq!(finish.media_type, "video");
    assert_eq!(finish.extension, "webm");
    assert_eq!(finish.status, "converting");
    assert_eq!(finish.workspace_uuid, "ws-456");
    assert_eq!(finish.width, 2560);
    assert_eq!(finish.height, 1440);
    assert_eq!(finish.duration, "2.50");
    assert_eq!(finish.capture_page_title, "Release notes");
    assert_eq!(finish.capture_page_url, "https://example.com/notes");
    assert_eq!(finish.capture_width, 2560);
    assert_eq!(finish.capture_height, 1440);
    assert_eq!(finish.capture_zoom, 100.0);

    Ok(())
}

#[tokio::test]
async fn test_failed_destination_request_publishes_error() -> Result<()> {
    let (api, base_url) = serve_fake_api().await;
    api.state.lock().await.fail_destination = true;

    let store = signed_in_store().await;
    let status = StatusBroadcaster::default();
    let mut events = status.subscribe();

    let client = ApiClient::new(api_config(&base_url), store.clone())?;
    let pipeline = UploadPipeline::new(client, store.clone(), status.clone());

    let artifact = Arc::new(video_artifact());
    pipeline.upload(Arc::clone(&artifact)).await;

    assert_eq!(next_upload_status(&mut events).await, UploadStatus::Uploading);
    assert_eq!(next_upload_status(&mut events).await, UploadStatus::Error);

    let state = api.state.lock().await;
    assert!(state.blobs.is_empty(), "no transfer after a failed request");
    assert!(state.finishes.is_empty());
    drop(state);

    // The artifact stays available for a manual fallback download
    assert!(store.artifact_ref(ArtifactKind::Video).await.is_some());

    Ok(())
}

#[tokio::test]
async fn test_failed_transfer_publishes_error() -> Result<()> {
    let (api, base_url) = serve_fake_api().await;
    api.state.lock().await.fail_transfer = true;

    let store = signed_in_store().await;
    let status = StatusBroadcaster::default();
    let mut events = status.subscribe();

    let client = ApiClient::new(api_config(&base_url), store.clone())?;
    let pipeline = UploadPipeline::new(client, store.clone(), status.clone());

    pipeline.upload(Arc::new(video_artifact())).await;

    assert_eq!(next_upload_status(&mut events).await, UploadStatus::Uploading);
    assert_eq!(next_upload_status(&mut events).await, UploadStatus::Error);

    assert!(api.state.lock().await.finishes.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_failed_finalize_publishes_error() -> Result<()> {
    let (api, base_url) = serve_fake_api().await;
    api.state.lock().await.fail_finish = true;

    let store = signed_in_store().await;
    let status = StatusBroadcaster::default();
    let mut events = status.subscribe();

    let client = ApiClient::new(api_config(&base_url), store.clone())?;
    let pipeline = UploadPipeline::new(client, store.clone(), status.clone());

    pipeline.upload(Arc::new(video_artifact())).await;

    assert_eq!(next_upload_status(&mut events).await, UploadStatus::Uploading);
    assert_eq!(next_upload_status(&mut events).await, UploadStatus::Error);

    // The blob made it to storage; only the finalize step failed
    assert_eq!(api.state.lock().await.blobs.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_unauthorized_clears_credentials() -> Result<()> {
    let (api, base_url) = serve_fake_api().await;
    api.state.lock().await.unauthorized = true;

    let store = signed_in_store().await;
    let status = StatusBroadcaster::default();
    let mut events = status.subscribe();

    let client = ApiClient::new(api_config(&base_url), store.clone())?;
    let pipeline = UploadPipeline::new(client, store.clone(), status.clone());

    pipeline.upload(Arc::new(video_artifact())).await;

    assert_eq!(next_upload_status(&mut events).await, UploadStatus::Uploading);
    assert_eq!(next_upload_status(&mut events).await, UploadStatus::Error);

    assert!(
        store.credentials().await.is_none(),
        "401 clears the stored credential"
    );

    Ok(())
}

#[tokio::test]
async fn test_missing_credentials_reaches_terminal_error() -> Result<()> {
    let (_api, base_url) = serve_fake_api().await;

    // Signed out: no credentials in the store
    let store = SharedStore::new();
    let status = StatusBroadcaster::default();
    let mut events = status.subscribe();

    let client = ApiClient::new(api_config(&base_url), store.clone())?;
    let pipeline = UploadPipeline::new(client, store.clone(), status.clone());

    pipeline.upload(Arc::new(video_artifact())).await;

    assert_eq!(next_upload_status(&mut events).await, UploadStatus::Uploading);
    assert_eq!(next_upload_status(&mut events).await, UploadStatus::Error);

    Ok(())
}

#[tokio::test]
async fn test_queued_uploads_serialize() -> Result<()> {
    let (api, base_url) = serve_fake_api().await;
    let store = signed_in_store().await;
    let status = StatusBroadcaster::default();
    let mut events = status.subscribe();

    let client = ApiClient::new(api_config(&base_url), store.clone())?;
    let queue = UploadPipeline::new(client, store.clone(), status.clone()).spawn();

    let first = Arc::new(video_artifact());
    let second = Arc::new(video_artifact());
    queue.enqueue(Arc::clone(&first)).await;
    queue.enqueue(Arc::clone(&second)).await;

    // Strict alternation: at most one upload is active at a time
    assert_eq!(next_upload_status(&mut events).await, UploadStatus::Uploading);
    assert_eq!(next_upload_status(&mut events).await, UploadStatus::Success);
    assert_eq!(next_upload_status(&mut events).await, UploadStatus::Uploading);
    assert_eq!(next_upload_status(&mut events).await, UploadStatus::Success);

    let state = api.state.lock().await;
    assert_eq!(state.finishes.len(), 2);
    assert_eq!(state.finishes[0].asset_uuid, first.id);
    assert_eq!(state.finishes[1].asset_uuid, second.id);

    Ok(())
}

#[tokio::test]
async fn test_screenshot_artifact_uses_image_namespace() -> Result<()> {
    let (api, base_url) = serve_fake_api().await;
    let store = signed_in_store().await;
    let status = StatusBroadcaster::default();

    let client = ApiClient::new(api_config(&base_url), store.clone())?;
    let pipeline = UploadPipeline::new(client, store.clone(), status.clone());

    let artifact = Arc::new(CapturedArtifact::new(
        ArtifactKind::Image,
        vec![1, 2, 3, 4],
        ArtifactMetadata {
            width: 1280,
            height: 720,
            duration_secs: 0.0,
            page_title: "Dashboard".to_string(),
            page_url: "https://example.com/dash".to_string(),
            zoom: 100.0,
        },
    ));
    pipeline.upload(Arc::clone(&artifact)).await;

    let state = api.state.lock().await;
    assert_eq!(
        state.destination_requests[0].key,
        format!("screenshot/{}.jpeg", artifact.id)
    );
    assert_eq!(state.destination_requests[0].content_type, "image/jpeg");

    let finish = &state.finishes[0];
    assert_eq!(finish.media_type, "image");
    assert_eq!(finish.extension, "jpeg");
    assert_eq!(finish.status, "done");
    assert_eq!(finish.duration, "0.00");

    Ok(())
}
