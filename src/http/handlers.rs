use super::state::AppState;
use crate::capture::ArtifactKind;
use crate::error::CoordinatorError;
use crate::status::RecorderSignal;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use futures::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;
use tracing::info;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub msg: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct RecordingStateResponse {
    pub recorder_status: RecorderSignal,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub token: String,
    pub workspace_id: String,
}

fn message(msg: &str) -> Json<MessageResponse> {
    Json(MessageResponse {
        msg: msg.to_string(),
    })
}

fn error_response(err: CoordinatorError) -> Response {
    let status = match err {
        CoordinatorError::InvalidState(_) => StatusCode::CONFLICT,
        CoordinatorError::CaptureUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        CoordinatorError::UploadTransport(_) => StatusCode::BAD_GATEWAY,
        CoordinatorError::AuthExpired => StatusCode::UNAUTHORIZED,
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /capture/record/start
pub async fn start_recording(State(state): State<AppState>) -> Response {
    match state.coordinator.start().await {
        Ok(()) => (StatusCode::OK, message("start-recording")).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /capture/record/stop
pub async fn stop_recording(State(state): State<AppState>) -> Response {
    match state.coordinator.stop().await {
        Ok(()) => (StatusCode::OK, message("stop-recording")).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /capture/state
/// Used by newly-opened UI surfaces to reconcile with a recording that
/// outlived them.
pub async fn recording_state(State(state): State<AppState>) -> impl IntoResponse {
    let status = state.coordinator.query_status().await;
    Json(RecordingStateResponse {
        recorder_status: status.signal(),
    })
}

/// POST /capture/reset
pub async fn reset_capture(State(state): State<AppState>) -> impl IntoResponse {
    state.coordinator.reset_state().await;
    message("capture-reset")
}

/// POST /capture/screenshot
pub async fn take_screenshot(State(state): State<AppState>) -> Response {
    match state.coordinator.take_screenshot().await {
        Ok(()) => (StatusCode::OK, message("take-screenshot")).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /capture/artifact/:kind
/// Manual fallback download of the last captured artifact.
pub async fn download_artifact(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Response {
    let kind = match kind.as_str() {
        "image" => ArtifactKind::Image,
        "video" => ArtifactKind::Video,
        other => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: format!("unknown artifact kind: {}", other),
                }),
            )
                .into_response()
        }
    };

    match state.store.artifact_ref(kind).await {
        Some(artifact) => {
            let filename = format!(
                "{}-{}.{}",
                Utc::now().format("%Y-%m-%d"),
                artifact.kind.filename_stem(),
                artifact.kind.extension()
            );

            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, artifact.kind.content_type().to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", filename),
                    ),
                ],
                artifact.payload.clone(),
            )
                .into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("no {} artifact available", kind.media_type()),
            }),
        )
            .into_response(),
    }
}

/// GET /window/size
pub async fn window_size(State(state): State<AppState>) -> Response {
    match state.coordinator.window_metrics().await {
        Ok(metrics) => (StatusCode::OK, Json(metrics)).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /window/bounds-changed
pub async fn bounds_changed(State(state): State<AppState>) -> impl IntoResponse {
    state.store.set_resized(true).await;
    message("bounds-changed")
}

/// GET /status
pub async fn status_snapshot(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.snapshot().await)
}

/// GET /status/stream
/// Server-sent events feed of recorder and upload status transitions.
pub async fn status_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.status.subscribe();

    let stream = stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    // Serialization of a plain enum can't fail; skip if it somehow does
                    let Ok(sse_event) = Event::default().json_data(&event) else {
                        continue;
                    };
                    return Some((Ok(sse_event), rx));
                }
                // Best-effort delivery: a lagged listener just misses events
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    state
        .store
        .set_credentials(crate::store::CredentialRecord {
            token: req.token,
            workspace_id: req.workspace_id,
        })
        .await;

    info!("Credentials stored");

    message("signed-in")
}

/// POST /auth/logout
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    state.store.clear_credentials().await;

    info!("Credentials cleared");

    message("signed-out")
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
