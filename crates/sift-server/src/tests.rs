//! Server API tests

use super::*;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use sift_core::ai::{MockBackend, RemoteClient};
use sift_core::test_utils::{MockGeminiBehavior, MockGeminiServer};
use sift_core::DeterministicClassifier;
use tower::ServiceExt;

fn test_router(mock: MockBackend) -> ClassificationRouter {
    ClassificationRouter::new(
        RemoteClient::Mock(mock),
        DeterministicClassifier::default(),
        Duration::from_secs(2),
    )
}

fn setup_test_app() -> Router {
    setup_test_app_with(MockBackend::new())
}

fn setup_test_app_with(mock: MockBackend) -> Router {
    let db = Database::in_memory().unwrap();
    let state = AppState::new(db, test_router(mock), Duration::from_secs(5));
    create_router(state, ServerConfig::default())
}

/// App wired to a real Gemini backend pointed at the mock server
fn setup_gemini_app(server: &MockGeminiServer, api_key: Option<&str>) -> Router {
    let mut config = ClassifierConfig::default().with_base_url(&server.url());
    config.api_key = api_key.map(str::to_string);
    let state = AppState::from_config(
        Database::in_memory().unwrap(),
        &config,
        Arc::new(KeywordRuleTable::builtin()),
    );
    create_router(state, ServerConfig::default())
}

async fn get_body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body();
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn categorize_request(body: serde_json::Value) -> Request<Body> {
    let body = body.to_string();
    Request::builder()
        .method("POST")
        .uri("/ai/categorize")
        .header("content-type", "application/json")
        .header("content-length", body.len())
        .body(Body::from(body))
        .unwrap()
}

fn sample_batch() -> serde_json::Value {
    serde_json::json!({
        "transactions": [
            {"id": "tx_1", "merchant_name": "Starbucks Coffee #4521", "amount": 5.75, "date": "2024-03-01"},
            {"id": "tx_2", "merchant_name": "Shell Oil 123", "amount": 42.10, "date": "2024-03-02", "description": "fuel"},
            {"id": "tx_3", "merchant_name": "Acme Corp", "amount": 120.0, "date": "2024-03-03", "category_hint": "Other"}
        ]
    })
}

// ========== Health API Tests ==========

#[tokio::test]
async fn test_health() {
    let response = setup_test_app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json, serde_json::json!({ "ok": true }));
}

#[tokio::test]
async fn test_db_check() {
    let response = setup_test_app().oneshot(get("/db-check")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["db"], true);
    assert_eq!(json["result"]["ok"], 1);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let response = setup_test_app().oneshot(get("/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ========== Categorize API Tests ==========

#[tokio::test]
async fn test_categorize_remote() {
    let response = setup_test_app()
        .oneshot(categorize_request(sample_batch()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["mode"], "remote");
    assert!(json.get("error").is_none());

    let categories = json["categories"].as_array().unwrap();
    assert_eq!(categories.len(), 3);
    assert_eq!(categories[0]["id"], "tx_1");
    assert_eq!(categories[0]["source"], "remote");
    assert_eq!(categories[1]["category"], "Gas");
}

#[tokio::test]
async fn test_categorize_without_credential_falls_back() {
    let response = setup_test_app_with(MockBackend::new().without_credential())
        .oneshot(categorize_request(sample_batch()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["mode"], "fallback");
    assert_eq!(json["error"]["code"], "missing-credential");

    let categories = json["categories"].as_array().unwrap();
    assert_eq!(categories[0]["category"], "Dining");
    assert_eq!(categories[0]["confidence"], 0.6);
    assert!(categories[0]["reason"].as_str().unwrap().contains("coffee"));
    assert_eq!(categories[2]["category"], "Other");
    assert_eq!(categories[2]["source"], "fallback_default");
}

#[tokio::test]
async fn test_categorize_partial_reply_is_mixed() {
    let response = setup_test_app_with(MockBackend::new().omitting(["tx_2"]))
        .oneshot(categorize_request(sample_batch()))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["mode"], "mixed");
    assert_eq!(json["error"]["code"], "partial-match");
    assert_eq!(json["categories"][1]["source"], "fallback");
    assert_eq!(json["categories"][0]["source"], "remote");
}

#[tokio::test]
async fn test_categorize_empty_batch() {
    let response = setup_test_app()
        .oneshot(categorize_request(serde_json::json!({ "transactions": [] })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["mode"], "remote");
    assert!(json["categories"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_categorize_malformed_body() {
    let response = setup_test_app()
        .oneshot(categorize_request(serde_json::json!({ "transactions": [{"id": 1}] })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = get_body_json(response).await;
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_categorize_body_limit() {
    let db = Database::in_memory().unwrap();
    let state = AppState::new(db, test_router(MockBackend::new()), Duration::from_secs(5));
    let config = ServerConfig {
        max_body_size: 64,
        ..Default::default()
    };
    let response = create_router(state, config)
        .oneshot(categorize_request(sample_batch()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

// ========== Gemini (mock server) Tests ==========

#[tokio::test]
async fn test_categorize_against_mock_gemini() {
    let server = MockGeminiServer::start(MockGeminiBehavior::default()).await;
    let response = setup_gemini_app(&server, Some("key"))
        .oneshot(categorize_request(sample_batch()))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["mode"], "remote");
    assert_eq!(json["categories"][0]["category"], "Dining");
}

#[tokio::test]
async fn test_categorize_mock_gemini_omits_one_id() {
    let server =
        MockGeminiServer::start(MockGeminiBehavior::Omit(vec!["tx_2".to_string()])).await;
    let response = setup_gemini_app(&server, Some("key"))
        .oneshot(categorize_request(sample_batch()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["mode"], "mixed");
    assert_eq!(json["error"]["code"], "partial-match");
    assert_eq!(
        json["error"]["message"],
        "1 of 3 transactions missing from remote response"
    );
    let sources: Vec<&str> = json["categories"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["source"].as_str().unwrap())
        .collect();
    assert_eq!(sources, vec!["remote", "fallback", "remote"]);
    assert_eq!(json["categories"][1]["id"], "tx_2");
    assert_eq!(json["categories"][1]["category"], "Gas");
}

#[tokio::test]
async fn test_categorize_quota_exceeded_falls_back() {
    let server = MockGeminiServer::start(MockGeminiBehavior::Status(429)).await;
    let response = setup_gemini_app(&server, Some("key"))
        .oneshot(categorize_request(sample_batch()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["mode"], "fallback");
    assert_eq!(json["error"]["code"], "quota-exceeded");
    assert_eq!(json["error"]["status"], 429);
    assert_eq!(json["categories"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_categorize_invalid_reply_falls_back() {
    let server = MockGeminiServer::start(MockGeminiBehavior::InvalidBody).await;
    let response = setup_gemini_app(&server, Some("key"))
        .oneshot(categorize_request(sample_batch()))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["mode"], "fallback");
    assert_eq!(json["error"]["code"], "parse-failure");
}

#[tokio::test]
async fn test_validate_endpoint() {
    let server = MockGeminiServer::start(MockGeminiBehavior::default()).await;

    let response = setup_gemini_app(&server, Some("key"))
        .oneshot(get("/ai/validate"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["model"], "gemini-2.0-flash");

    let response = setup_gemini_app(&server, Some("bad"))
        .oneshot(get("/ai/validate"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["ok"], false);
    assert_eq!(json["error"]["code"], "credential-invalid");
}

#[tokio::test]
async fn test_validate_without_key() {
    let server = MockGeminiServer::start(MockGeminiBehavior::default()).await;
    let response = setup_gemini_app(&server, None)
        .oneshot(get("/ai/validate"))
        .await
        .unwrap();
    let json = get_body_json(response).await;
    assert_eq!(json["ok"], false);
    assert_eq!(json["error"]["code"], "missing-credential");
}

// ========== Self-Test API Tests ==========

#[tokio::test]
async fn test_selftest_passes() {
    let server = MockGeminiServer::start(MockGeminiBehavior::default()).await;
    let response = setup_gemini_app(&server, Some("key"))
        .oneshot(get("/ai/selftest"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = get_body_json(response).await;
    assert_eq!(json["ok"], true);
    assert_eq!(json["mode"], "remote");
    assert_eq!(json["details"], "Self-test passed");
    assert!(json["checked_at"].is_string());
}

#[tokio::test]
async fn test_selftest_reports_generation_step() {
    let server = MockGeminiServer::start(MockGeminiBehavior::GenerateStatus(500)).await;
    let response = setup_gemini_app(&server, Some("key"))
        .oneshot(get("/ai/selftest"))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["ok"], false);
    assert_eq!(json["step"], "generation");
    assert_eq!(json["status"], 500);
    assert_eq!(json["code"], "http-error");
}

#[tokio::test]
async fn test_selftest_reports_validation_step() {
    let response = setup_test_app_with(MockBackend::new().without_credential())
        .oneshot(get("/ai/selftest"))
        .await
        .unwrap();

    let json = get_body_json(response).await;
    assert_eq!(json["ok"], false);
    assert_eq!(json["step"], "validation");
    assert_eq!(json["code"], "missing-credential");
}

// ========== Config Tests ==========

#[test]
fn test_server_config_default() {
    let config = ServerConfig::default();
    assert!(config.allowed_origins.is_empty());
    assert_eq!(config.max_body_size, MAX_BODY_SIZE);
}
