//! Test utilities for sift-core
//!
//! Provides a mock Gemini server that speaks enough of the Generative
//! Language API for the HTTP backend, the router and the self-test to be
//! exercised end to end without network access.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::ai::{GenerationOptions, MockBackend, RemoteBackend};

/// The only API key the mock server accepts
pub const MOCK_API_KEY: &str = "key";

/// Models reported by the mock listing endpoint
pub const MOCK_MODELS: &[&str] = &["models/gemini-2.0-flash", "models/gemini-1.5-pro"];

/// Scripted server behaviour
#[derive(Debug, Clone, Default)]
pub enum MockGeminiBehavior {
    /// Answer every transaction in the prompt
    #[default]
    Ok,
    /// Answer, but leave these ids out
    Omit(Vec<String>),
    /// Return this status from every endpoint
    Status(u16),
    /// List models normally, return this status from generateContent
    GenerateStatus(u16),
    /// Return this text as the model reply
    RawText(String),
    /// Return a 200 whose body is not JSON
    InvalidBody,
    /// Sleep before answering
    Stall(Duration),
}

/// Mock Gemini server for testing and development
pub struct MockGeminiServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockGeminiServer {
    /// Start the mock server on an available port
    pub async fn start(behavior: MockGeminiBehavior) -> Self {
        let app = Router::new()
            .route("/models", get(handle_models))
            .route("/models/:action", post(handle_generate))
            .with_state(Arc::new(behavior));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server (use as `GEMINI_BASE_URL`)
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockGeminiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Deserialize)]
struct GenerateBody {
    contents: Vec<ContentBody>,
}

#[derive(Debug, Deserialize)]
struct ContentBody {
    parts: Vec<PartBody>,
}

#[derive(Debug, Deserialize)]
struct PartBody {
    text: String,
}

fn error_response(status: u16, message: &str) -> Response {
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = json!({
        "error": { "code": status.as_u16(), "message": message, "status": "MOCK_ERROR" }
    });
    (status, Json(body)).into_response()
}

/// Common checks for every endpoint: stall, scripted status, API key
async fn gate(behavior: &MockGeminiBehavior, headers: &HeaderMap) -> Option<Response> {
    if let MockGeminiBehavior::Stall(delay) = behavior {
        tokio::time::sleep(*delay).await;
    }
    if let MockGeminiBehavior::Status(status) = behavior {
        return Some(error_response(*status, "scripted failure"));
    }
    let key = headers.get("x-goog-api-key").and_then(|v| v.to_str().ok());
    if key != Some(MOCK_API_KEY) {
        return Some(error_response(403, "API key not valid"));
    }
    None
}

async fn handle_models(
    State(behavior): State<Arc<MockGeminiBehavior>>,
    headers: HeaderMap,
) -> Response {
    if let Some(response) = gate(&behavior, &headers).await {
        return response;
    }
    let models: Vec<Value> = MOCK_MODELS
        .iter()
        .map(|name| json!({ "name": name, "displayName": name }))
        .collect();
    Json(json!({ "models": models })).into_response()
}

async fn handle_generate(
    State(behavior): State<Arc<MockGeminiBehavior>>,
    headers: HeaderMap,
    Json(body): Json<GenerateBody>,
) -> Response {
    if let Some(response) = gate(&behavior, &headers).await {
        return response;
    }

    let prompt = body
        .contents
        .iter()
        .flat_map(|c| c.parts.iter())
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let text = match behavior.as_ref() {
        MockGeminiBehavior::GenerateStatus(status) => {
            return error_response(*status, "scripted generation failure")
        }
        MockGeminiBehavior::InvalidBody => return (StatusCode::OK, "<html>oops</html>").into_response(),
        MockGeminiBehavior::RawText(text) => text.clone(),
        MockGeminiBehavior::Omit(ids) => answer(MockBackend::new().omitting(ids.clone()), &prompt).await,
        _ => answer(MockBackend::new(), &prompt).await,
    };

    Json(json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    }))
    .into_response()
}

async fn answer(mock: MockBackend, prompt: &str) -> String {
    mock.generate(prompt, &GenerationOptions::classification())
        .await
        .unwrap_or_default()
}
