//! MoodWise HTTP JSON API
//!
//! Axum router over the in-memory store and the companion backend. Each
//! endpoint has a thin axum handler that delegates to an `*_inner` function
//! returning `(StatusCode, serde_json::Value)`, which tests call directly.
//!
//! Endpoints:
//! - POST   /api/chat/session      — start an anonymous session
//! - GET    /api/chat/session/:id  — session plus transcript
//! - DELETE /api/chat/session/:id  — end a session
//! - POST   /api/chat/message      — one chat turn
//! - GET    /health                — liveness and session count
//! - GET    /version               — server version info

use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use moodwise_core::{
    ChatStore, CompanionBackend, MoodwiseConfig, MoodwiseError, NewChatSession, StoreError,
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::chat;

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub store: Arc<dyn ChatStore>,
    pub companion: Arc<dyn CompanionBackend>,
    pub config: MoodwiseConfig,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/api/chat/session", post(create_session_handler))
        .route(
            "/api/chat/session/:id",
            get(get_session_handler).delete(end_session_handler),
        )
        .route("/api/chat/message", post(send_message_handler))
        .with_state(state)
}

/// Serve on the configured address until the shutdown signal fires.
pub async fn start_http_server(
    state: HttpState,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", state.config.http.host, state.config.http.port);

    let app = build_router(Arc::new(state));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("MoodWise HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub session_id: Option<String>,
    pub content: Option<String>,
}

fn failure(status: StatusCode, message: &str) -> (StatusCode, serde_json::Value) {
    (status, json!({ "message": message }))
}

// ============================================================================
// Inner (directly testable) functions
// ============================================================================

pub async fn health_inner(store: &dyn ChatStore) -> (StatusCode, serde_json::Value) {
    match store.count_sessions().await {
        Ok(sessions) => (
            StatusCode::OK,
            json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "sessions": sessions,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            json!({
                "status": "unhealthy",
                "error": e.to_string(),
            }),
        ),
    }
}

pub fn version_inner() -> serde_json::Value {
    json!({
        "version": env!("CARGO_PKG_VERSION"),
        "service": "moodwise",
    })
}

pub async fn create_session_inner(store: &dyn ChatStore) -> (StatusCode, serde_json::Value) {
    let session = match store.create_session(NewChatSession::anonymous()).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Error creating chat session");
            return failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create chat session",
            );
        }
    };

    match serde_json::to_value(&session) {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => {
            tracing::error!(error = %e, "Error serializing chat session");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to create chat session",
            )
        }
    }
}

pub async fn get_session_inner(
    store: &dyn ChatStore,
    session_id: &str,
) -> (StatusCode, serde_json::Value) {
    let fetched = async {
        let session = store.get_session(session_id).await?;
        let messages = store.get_messages(session_id).await?;
        Ok::<_, StoreError>((session, messages))
    }
    .await;

    match fetched {
        Ok((Some(session), messages)) => (
            StatusCode::OK,
            json!({ "session": session, "messages": messages }),
        ),
        Ok((None, _)) => failure(StatusCode::NOT_FOUND, "Session not found"),
        Err(e) => {
            tracing::error!(session_id = %session_id, error = %e, "Error fetching chat session");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to fetch chat session",
            )
        }
    }
}

pub async fn send_message_inner(
    state: &HttpState,
    req: SendMessageRequest,
) -> (StatusCode, serde_json::Value) {
    let content = match req.content {
        Some(c) if !c.trim().is_empty() => c,
        _ => return failure(StatusCode::BAD_REQUEST, "Message content is required"),
    };

    let session_id = match req.session_id {
        Some(id) if !id.is_empty() => id,
        _ => return failure(StatusCode::BAD_REQUEST, "Session ID is required"),
    };

    let outcome = chat::process_turn(
        state.store.as_ref(),
        state.companion.as_ref(),
        &session_id,
        &content,
        state.config.chat.history_limit,
    )
    .await;

    match outcome {
        Ok(turn) => match serde_json::to_value(&turn) {
            Ok(body) => (StatusCode::OK, body),
            Err(e) => {
                tracing::error!(error = %e, "Error serializing chat turn");
                failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process message")
            }
        },
        Err(MoodwiseError::Store(StoreError::SessionNotFound(_))) => {
            failure(StatusCode::NOT_FOUND, "Session not found")
        }
        Err(e) => {
            tracing::error!(session_id = %session_id, error = %e, "Error processing message");
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process message")
        }
    }
}

/// Body the message endpoint returns when axum could not extract the JSON.
/// A missing or unparsable body counts as missing content; a well-formed
/// body with wrongly typed fields is a processing failure.
pub fn rejected_message_inner(rejection: &JsonRejection) -> (StatusCode, serde_json::Value) {
    tracing::warn!(error = %rejection.body_text(), "Rejected chat message body");
    match rejection {
        JsonRejection::JsonDataError(_) => {
            failure(StatusCode::INTERNAL_SERVER_ERROR, "Failed to process message")
        }
        _ => failure(StatusCode::BAD_REQUEST, "Message content is required"),
    }
}

pub async fn end_session_inner(
    store: &dyn ChatStore,
    session_id: &str,
) -> (StatusCode, serde_json::Value) {
    match store.end_session(session_id).await {
        Ok(()) => (
            StatusCode::OK,
            json!({ "message": "Session ended successfully" }),
        ),
        Err(e) => {
            tracing::error!(session_id = %session_id, error = %e, "Error ending chat session");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to end chat session",
            )
        }
    }
}

// ============================================================================
// Axum handler wrappers
// ============================================================================

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(state.store.as_ref()).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn create_session_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = create_session_inner(state.store.as_ref()).await;
    (status, Json(body))
}

pub async fn get_session_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let (status, body) = get_session_inner(state.store.as_ref(), &id).await;
    (status, Json(body))
}

pub async fn end_session_handler(
    State(state): State<Arc<HttpState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let (status, body) = end_session_inner(state.store.as_ref(), &id).await;
    (status, Json(body))
}

pub async fn send_message_handler(
    State(state): State<Arc<HttpState>>,
    req: Result<Json<SendMessageRequest>, JsonRejection>,
) -> impl IntoResponse {
    let (status, body) = match req {
        Ok(Json(req)) => send_message_inner(&state, req).await,
        Err(rejection) => rejected_message_inner(&rejection),
    };
    (status, Json(body))
}

// ============================================================================
// Unit Tests
// ============================================================================
