//! Sift Web Server
//!
//! Axum-based REST API over the classification router.
//!
//! - `GET  /health`        liveness
//! - `GET  /db-check`      database connectivity
//! - `POST /ai/categorize` classify a batch (always answers, degrading to rules)
//! - `GET  /ai/selftest`   end-to-end probe of the remote model
//! - `GET  /ai/validate`   model availability check
//!
//! The handlers hold no business logic; everything is delegated to `sift-core`.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use sift_core::ai::RemoteBackend;
use sift_core::{ClassificationRouter, ClassifierConfig, Database, KeywordRuleTable};

mod handlers;

/// Maximum request body size (2 MB)
pub const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
    /// Maximum accepted request body in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![],
            max_body_size: MAX_BODY_SIZE,
        }
    }
}

impl ServerConfig {
    /// Create from environment variables
    ///
    /// `SIFT_ALLOWED_ORIGINS` is a comma-separated origin list.
    pub fn from_env() -> Self {
        let allowed_origins = std::env::var("SIFT_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            allowed_origins,
            ..Default::default()
        }
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub router: ClassificationRouter,
    /// Bound on the self-test generation call
    pub probe_timeout: Duration,
}

impl AppState {
    pub fn new(db: Database, router: ClassificationRouter, probe_timeout: Duration) -> Self {
        Self {
            db,
            router,
            probe_timeout,
        }
    }

    /// Build state from a classifier configuration and rule table
    pub fn from_config(
        db: Database,
        config: &ClassifierConfig,
        rules: Arc<KeywordRuleTable>,
    ) -> Self {
        Self::new(
            db,
            ClassificationRouter::from_config(config, rules),
            config.probe_timeout,
        )
    }
}

/// Create the application router
pub fn create_router(state: AppState, config: ServerConfig) -> Router {
    let state = Arc::new(state);

    let ai_routes = Router::new()
        .route("/categorize", post(handlers::categorize))
        .route("/selftest", get(handlers::selftest))
        .route("/validate", get(handlers::validate));

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    } else {
        // Allow specified origins
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE])
    };

    Router::new()
        .route("/health", get(handlers::health))
        .route("/db-check", get(handlers::db_check))
        .nest("/ai", ai_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(config.max_body_size))
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    state: AppState,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    // Startup validation is informational; classification degrades on its own
    check_remote_model(&state.router).await;

    let app = create_router(state, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log remote model availability
async fn check_remote_model(router: &ClassificationRouter) {
    let remote = router.remote();
    let result = remote.validate_model_availability().await;

    if result.ok {
        info!(
            "✅ Gemini model available: {} ({})",
            result.model,
            remote.host()
        );
    } else {
        let (code, message) = result
            .error
            .as_ref()
            .map(|e| (e.code.as_str(), e.message.as_str()))
            .unwrap_or(("unknown", ""));
        warn!(
            code,
            "⚠️  Gemini model {} unavailable, batches will use keyword rules: {}",
            result.model,
            message
        );
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}

#[cfg(test)]
mod tests;
