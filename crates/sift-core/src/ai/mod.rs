//! Pluggable remote classification backend
//!
//! This module provides a backend-agnostic interface to the remote model.
//!
//! # Architecture
//!
//! - `RemoteBackend` trait: transport primitives every backend implements
//! - `RemoteClient` enum: concrete wrapper providing Clone + compile-time dispatch,
//!   and the shared validation and batch classification logic
//! - Backend implementations: `GeminiBackend`, `MockBackend`
//!
//! # Usage
//!
//! ```rust,ignore
//! let client = RemoteClient::from_config(&ClassifierConfig::from_env());
//!
//! let validation = client.validate_model_availability().await;
//! if validation.ok {
//!     let answers = client.classify_batch(&transactions).await?;
//! }
//! ```
//!
//! # Configuration
//!
//! See [`crate::config::ClassifierConfig`] for the environment variables.

mod gemini;
mod mock;
pub mod parsing;
pub mod types;

pub use gemini::GeminiBackend;
pub use mock::MockBackend;
pub use types::*;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::config::ClassifierConfig;
use crate::error::{RemoteError, RemoteErrorKind};
use crate::models::{Transaction, ValidationResult};
use crate::prompts::build_batch_prompt;

/// How many listed model names to include in the warning log
const LOGGED_MODEL_SAMPLE: usize = 5;

/// Trait defining the transport interface for all remote backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// List model names visible to the configured credential
    async fn list_models(&self) -> Result<Vec<String>, RemoteError>;

    /// Run one generation call and return the reply text
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, RemoteError>;

    /// Get the model name
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;

    /// Whether a credential is configured
    fn has_credential(&self) -> bool;
}

/// Concrete remote client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum RemoteClient {
    /// Google Gemini (Generative Language API)
    Gemini(GeminiBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl RemoteClient {
    /// Create a client from a loaded configuration
    pub fn from_config(config: &ClassifierConfig) -> Self {
        RemoteClient::Gemini(GeminiBackend::from_config(config))
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        RemoteClient::Mock(MockBackend::new())
    }

    /// Check that the credential is accepted and the configured model is listed
    ///
    /// Fails closed: any failure (including a missing credential) reports the
    /// model as unavailable. Never returns an error.
    pub async fn validate_model_availability(&self) -> ValidationResult {
        let model = self.model().to_string();

        if !self.has_credential() {
            error!("GEMINI_API_KEY is not set; remote classification disabled");
            return ValidationResult::unavailable(&model, &RemoteError::missing_credential());
        }

        let listed = match self.list_models().await {
            Ok(listed) => listed,
            Err(e) => {
                match e.kind {
                    RemoteErrorKind::CredentialInvalid => {
                        error!(model = %model, "Gemini rejected the API key")
                    }
                    _ => error!(model = %model, code = e.kind.as_str(), "Model validation failed: {}", e.message),
                }
                return ValidationResult::unavailable(&model, &e);
            }
        };

        let qualified = format!("models/{}", model);
        if listed.iter().any(|name| *name == qualified || *name == model) {
            info!(model = %model, host = %self.host(), "Gemini model is available");
            return ValidationResult::passed(&model);
        }

        let sample: Vec<&str> = listed
            .iter()
            .take(LOGGED_MODEL_SAMPLE)
            .map(String::as_str)
            .collect();
        warn!(
            model = %model,
            available = ?sample,
            "Configured model not found in model listing"
        );

        let err = RemoteError {
            kind: RemoteErrorKind::ModelNotFound,
            message: format!("404: Model {} Not Found", model),
            status: None,
        };
        let mut result = ValidationResult::unavailable(&model, &err);
        result.available = listed;
        result
    }

    /// Classify a batch with one remote call
    ///
    /// Returns the usable answers in reply order. Ids are not checked against
    /// the batch here; that is the router's job.
    pub async fn classify_batch(
        &self,
        transactions: &[Transaction],
    ) -> Result<Vec<RemoteAnswer>, RemoteError> {
        let prompt = build_batch_prompt(transactions);
        let text = self
            .generate(&prompt, &GenerationOptions::classification())
            .await?;
        debug!(model = %self.model(), "Raw batch reply: {}", text);

        parsing::parse_batch_response(&text)
    }
}

#[async_trait]
impl RemoteBackend for RemoteClient {
    async fn list_models(&self) -> Result<Vec<String>, RemoteError> {
        match self {
            RemoteClient::Gemini(b) => b.list_models().await,
            RemoteClient::Mock(b) => b.list_models().await,
        }
    }

    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String, RemoteError> {
        match self {
            RemoteClient::Gemini(b) => b.generate(prompt, options).await,
            RemoteClient::Mock(b) => b.generate(prompt, options).await,
        }
    }

    fn model(&self) -> &str {
        match self {
            RemoteClient::Gemini(b) => b.model(),
            RemoteClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            RemoteClient::Gemini(b) => b.host(),
            RemoteClient::Mock(b) => b.host(),
        }
    }

    fn has_credential(&self) -> bool {
        match self {
            RemoteClient::Gemini(b) => b.has_credential(),
            RemoteClient::Mock(b) => b.has_credential(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;
    use crate::test_utils::{MockGeminiBehavior, MockGeminiServer};

    fn gemini_client(url: &str, key: Option<&str>) -> RemoteClient {
        RemoteClient::Gemini(GeminiBackend::new(url, "gemini-2.0-flash", key))
    }

    #[test]
    fn test_remote_client_mock() {
        let client = RemoteClient::mock();
        assert!(client.has_credential());
        assert_eq!(client.host(), "mock://");
    }

    #[test]
    fn test_from_config_without_key() {
        let client = RemoteClient::from_config(&ClassifierConfig::default());
        assert!(!client.has_credential());
        assert_eq!(client.model(), "gemini-2.0-flash");
    }

    #[tokio::test]
    async fn test_validation_fails_closed_without_credential() {
        let client = RemoteClient::Mock(MockBackend::new().without_credential());
        let result = client.validate_model_availability().await;
        assert!(!result.ok);
        assert_eq!(result.error_kind(), Some("missing-credential"));
    }

    #[tokio::test]
    async fn test_validation_passes_for_listed_model() {
        let result = RemoteClient::mock().validate_model_availability().await;
        assert!(result.ok, "{:?}", result.error);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_validation_reports_unlisted_model() {
        let client = RemoteClient::Mock(
            MockBackend::new().with_models(vec!["models/gemini-1.5-pro".to_string()]),
        );
        let result = client.validate_model_availability().await;
        assert!(!result.ok);
        assert_eq!(result.error_kind(), Some("model-not-found"));
        assert_eq!(result.available, vec!["models/gemini-1.5-pro"]);
    }

    #[tokio::test]
    async fn test_validation_against_mock_server() {
        let server = MockGeminiServer::start(MockGeminiBehavior::default()).await;

        let ok = gemini_client(&server.url(), Some("key"))
            .validate_model_availability()
            .await;
        assert!(ok.ok);

        let bad_key = gemini_client(&server.url(), Some("wrong"))
            .validate_model_availability()
            .await;
        assert!(!bad_key.ok);
        assert_eq!(bad_key.error_kind(), Some("credential-invalid"));
    }

    #[tokio::test]
    async fn test_classify_batch_with_mock() {
        let txs = vec![
            Transaction::new("a", "Starbucks", 4.5, "2024-01-01"),
            Transaction::new("b", "Netflix", 15.99, "2024-01-02"),
        ];
        let answers = RemoteClient::mock().classify_batch(&txs).await.unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].category, Category::Dining);
        assert_eq!(answers[1].category, Category::Subscriptions);
    }

    #[tokio::test]
    async fn test_classify_batch_against_mock_server() {
        let server = MockGeminiServer::start(MockGeminiBehavior::default()).await;
        let txs = vec![
            Transaction::new("tx_1", "Shell", 40.0, "2024-01-01"),
            Transaction::new("tx_2", "Amazon", 25.0, "2024-01-02"),
        ];
        let answers = gemini_client(&server.url(), Some("key"))
            .classify_batch(&txs)
            .await
            .unwrap();
        let ids: Vec<&str> = answers.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["tx_1", "tx_2"]);
    }

    #[tokio::test]
    async fn test_classify_batch_invalid_json_is_parse_failure() {
        let server = MockGeminiServer::start(MockGeminiBehavior::RawText(
            "I think these are all Dining".to_string(),
        ))
        .await;
        let txs = vec![Transaction::new("tx_1", "Shell", 40.0, "2024-01-01")];
        let err = gemini_client(&server.url(), Some("key"))
            .classify_batch(&txs)
            .await
            .unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::ResponseParse);
    }
}
