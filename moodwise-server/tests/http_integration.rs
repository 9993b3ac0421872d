//! HTTP integration tests for the MoodWise chat API
//!
//! Requests go through the full Axum router via `oneshot`. The Groq API is
//! stood in for by a wiremock server, so the real `GroqClient` is exercised
//! end to end including its fallback path.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use moodwise_core::config::GroqConfig;
use moodwise_core::{GroqClient, MemoryStore, MoodwiseConfig};
use moodwise_server::http::{build_router, HttpState};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str) -> Value {
    json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
}

/// Router backed by a fresh store and a Groq client pointed at `mock_server`.
fn make_app(mock_server: &MockServer) -> Router {
    let groq = GroqConfig {
        api_key: Some("test-api-key".to_string()),
        timeout_seconds: 5,
        ..GroqConfig::default()
    };
    let client = GroqClient::with_base_url(groq, mock_server.uri()).expect("client");

    build_router(Arc::new(HttpState {
        store: Arc::new(MemoryStore::new()),
        companion: Arc::new(client),
        config: MoodwiseConfig::default(),
    }))
}

async fn mount_happy_groq(mock_server: &MockServer, reply: &str, mood_json: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "max_tokens": 500 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(reply)))
        .mount(mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "max_tokens": 150 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(mood_json)))
        .mount(mock_server)
        .await;
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&b).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// POST a raw body to the message endpoint, bypassing JSON encoding.
async fn post_raw(app: &Router, content_type: Option<&str>, body: &str) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("POST").uri("/api/chat/message");
    if let Some(ct) = content_type {
        builder = builder.header("content-type", ct);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn start_session(app: &Router) -> String {
    let (status, body) = send(app, "POST", "/api/chat/session", None).await;
    assert_eq!(status, StatusCode::OK);
    body["id"].as_str().expect("session id").to_string()
}

#[tokio::test]
async fn test_full_conversation_round() {
    let mock_server = MockServer::start().await;
    mount_happy_groq(
        &mock_server,
        "I'm sorry the day was hard. What happened?",
        r#"{"score": 3, "sentiment": "negative", "confidence": 0.8}"#,
    )
    .await;
    let app = make_app(&mock_server);

    let session_id = start_session(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/chat/message",
        Some(json!({ "sessionId": session_id, "content": "Today was rough" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "body: {}", body);
    assert_eq!(body["userMessage"]["content"], "Today was rough");
    assert!(body["userMessage"]["moodScore"].is_null());
    assert_eq!(
        body["aiMessage"]["content"],
        "I'm sorry the day was hard. What happened?"
    );
    assert_eq!(body["aiMessage"]["moodScore"], 3.0);
    assert_eq!(body["moodAnalysis"]["sentiment"], "negative");
    assert_eq!(body["moodAnalysis"]["summary"], "Mood: 3/10 (negative)");

    let (status, body) = send(&app, "GET", &format!("/api/chat/session/{}", session_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["id"], session_id.as_str());
    assert_eq!(body["session"]["averageMoodScore"], 3.0);
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["sender"], "user");
    assert_eq!(messages[1]["sender"], "ai");
}

#[tokio::test]
async fn test_session_average_is_mean_of_turn_scores() {
    let mock_server = MockServer::start().await;
    let app = make_app(&mock_server);
    let session_id = start_session(&app).await;

    for (score, expected_avg) in [(8.0, 8.0), (4.0, 6.0), (3.0, 5.0)] {
        mock_server.reset().await;
        mount_happy_groq(
            &mock_server,
            "Thanks for sharing.",
            &format!(r#"{{"score": {}, "sentiment": "neutral", "confidence": 0.5}}"#, score),
        )
        .await;

        let (status, _) = send(
            &app,
            "POST",
            "/api/chat/message",
            Some(json!({ "sessionId": session_id, "content": "update" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, "GET", &format!("/api/chat/session/{}", session_id), None).await;
        let avg = body["session"]["averageMoodScore"].as_f64().unwrap();
        assert!(
            (avg - expected_avg).abs() < 1e-9,
            "expected {}, got {}",
            expected_avg,
            avg
        );
    }
}

#[tokio::test]
async fn test_out_of_range_mood_is_clamped() {
    let mock_server = MockServer::start().await;
    mount_happy_groq(
        &mock_server,
        "Wow!",
        r#"{"score": 42, "sentiment": "very_positive", "confidence": 1}"#,
    )
    .await;
    let app = make_app(&mock_server);
    let session_id = start_session(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/chat/message",
        Some(json!({ "sessionId": session_id, "content": "Best day ever" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["moodAnalysis"]["score"], 10.0);
    assert_eq!(body["aiMessage"]["moodScore"], 10.0);
}

#[tokio::test]
async fn test_groq_outage_returns_neutral_fallback() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("service unavailable"))
        .mount(&mock_server)
        .await;
    let app = make_app(&mock_server);
    let session_id = start_session(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/chat/message",
        Some(json!({ "sessionId": session_id, "content": "hello?" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "AI failure must not surface as an error");
    assert_eq!(
        body["aiMessage"]["content"],
        "I'm here to listen. Could you tell me a bit more about how you're feeling?"
    );
    assert_eq!(body["moodAnalysis"]["score"], 5.0);
    assert_eq!(body["moodAnalysis"]["sentiment"], "neutral");
    assert_eq!(body["moodAnalysis"]["summary"], "Mood: 5/10 (neutral)");
}

#[tokio::test]
async fn test_message_without_session_id_is_400() {
    let mock_server = MockServer::start().await;
    let app = make_app(&mock_server);

    let (status, body) = send(
        &app,
        "POST",
        "/api/chat/message",
        Some(json!({ "content": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Session ID is required");

    assert!(
        mock_server.received_requests().await.unwrap().is_empty(),
        "no Groq call for a rejected request"
    );
}

#[tokio::test]
async fn test_message_without_content_is_400() {
    let mock_server = MockServer::start().await;
    let app = make_app(&mock_server);
    let session_id = start_session(&app).await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/chat/message",
        Some(json!({ "sessionId": session_id, "content": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Message content is required");
}

#[tokio::test]
async fn test_message_without_json_content_type_is_400() {
    let mock_server = MockServer::start().await;
    let app = make_app(&mock_server);

    let (status, body) = post_raw(&app, None, r#"{"sessionId":"s","content":"hi"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Message content is required");
}

#[tokio::test]
async fn test_message_with_empty_or_broken_body_is_400() {
    let mock_server = MockServer::start().await;
    let app = make_app(&mock_server);

    for raw in ["", "{\"content\": "] {
        let (status, body) = post_raw(&app, Some("application/json"), raw).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {:?}", raw);
        assert_eq!(body["message"], "Message content is required");
    }
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_message_with_mistyped_fields_is_500() {
    let mock_server = MockServer::start().await;
    let app = make_app(&mock_server);

    let (status, body) = post_raw(
        &app,
        Some("application/json"),
        r#"{"sessionId":5,"content":"hi"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Failed to process message");
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_unknown_session_is_404() {
    let mock_server = MockServer::start().await;
    let app = make_app(&mock_server);

    let (status, body) = send(&app, "GET", "/api/chat/session/session_0_missing00", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Session not found");
}

#[tokio::test]
async fn test_delete_ends_session() {
    let mock_server = MockServer::start().await;
    let app = make_app(&mock_server);
    let session_id = start_session(&app).await;

    let (status, body) = send(&app, "DELETE", &format!("/api/chat/session/{}", session_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Session ended successfully");

    let (_, body) = send(&app, "GET", &format!("/api/chat/session/{}", session_id), None).await;
    assert!(body["session"]["endedAt"].is_string());
}

#[tokio::test]
async fn test_health_and_version_endpoints() {
    let mock_server = MockServer::start().await;
    let app = make_app(&mock_server);
    start_session(&app).await;

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["sessions"], 1);

    let (status, body) = send(&app, "GET", "/version", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "moodwise");
}
