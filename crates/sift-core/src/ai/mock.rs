//! Mock backend for testing
//!
//! Answers batch prompts by reading back the `- ID:` lines it was sent, so
//! tests exercise the real prompt builder and reply parser. Behaviour can be
//! scripted per test: omit ids, return raw text, fail, or stall.

use std::collections::HashSet;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::json;

use crate::config::DEFAULT_MODEL;
use crate::error::RemoteError;
use crate::models::Category;
use crate::prompts::TRANSACTION_LINE_PREFIX;

use super::types::GenerationOptions;
use super::RemoteBackend;

/// Confidence the mock reports for every answer
pub const MOCK_CONFIDENCE: f64 = 0.9;

fn transaction_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?m)^{}(.+?) \| Merchant: (.*?) \| Amount:",
            regex::escape(TRANSACTION_LINE_PREFIX)
        ))
        .expect("valid regex")
    })
}

/// Mock remote backend for testing
#[derive(Clone, Debug)]
pub struct MockBackend {
    /// Whether a credential is "configured"
    pub has_credential: bool,
    model: String,
    /// Models reported by `list_models`; `None` lists the configured model
    models: Option<Vec<String>>,
    /// Ids left out of batch replies
    omit: HashSet<String>,
    /// Fixed reply text returned instead of a generated answer
    raw_response: Option<String>,
    /// Error returned by every call
    failure: Option<RemoteError>,
    /// Delay before replying
    stall: Option<Duration>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (credential present, model listed)
    pub fn new() -> Self {
        Self {
            has_credential: true,
            model: DEFAULT_MODEL.to_string(),
            models: None,
            omit: HashSet::new(),
            raw_response: None,
            failure: None,
            stall: None,
        }
    }

    /// Report no credential
    pub fn without_credential(mut self) -> Self {
        self.has_credential = false;
        self
    }

    /// Leave these ids out of batch replies
    pub fn omitting<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.omit.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Reply with fixed text
    pub fn with_raw_response(mut self, text: &str) -> Self {
        self.raw_response = Some(text.to_string());
        self
    }

    /// Fail every call with this error
    pub fn failing(mut self, err: RemoteError) -> Self {
        self.failure = Some(err);
        self
    }

    /// Sleep before replying
    pub fn stalling(mut self, delay: Duration) -> Self {
        self.stall = Some(delay);
        self
    }

    /// Report these names from `list_models`
    pub fn with_models(mut self, models: Vec<String>) -> Self {
        self.models = Some(models);
        self
    }

    /// Create a new instance with a different model
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            model: model.to_string(),
            ..self.clone()
        }
    }

    async fn preamble(&self) -> Result<(), RemoteError> {
        if !self.has_credential {
            return Err(RemoteError::missing_credential());
        }
        if let Some(delay) = self.stall {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// Keyword guess used for mock answers
fn guess_category(merchant: &str) -> Category {
    match merchant.to_uppercase().as_str() {
        m if m.contains("NETFLIX") || m.contains("SPOTIFY") || m.contains("HULU") => {
            Category::Subscriptions
        }
        m if m.contains("AMAZON") || m.contains("EBAY") => Category::OnlineShopping,
        m if m.contains("STARBUCKS") || m.contains("CAFE") || m.contains("PIZZA") => {
            Category::Dining
        }
        m if m.contains("UBER") || m.contains("DELTA") || m.contains("HOTEL") => Category::Travel,
        m if m.contains("WHOLE FOODS") || m.contains("KROGER") || m.contains("SAFEWAY") => {
            Category::Groceries
        }
        m if m.contains("SHELL") || m.contains("CHEVRON") || m.contains("EXXON") => Category::Gas,
        m if m.contains("CVS") || m.contains("WALGREENS") => Category::Healthcare,
        m if m.contains("COMCAST") || m.contains("VERIZON") => Category::Utilities,
        m if m.contains("RENT") || m.contains("APARTMENT") => Category::Rent,
        _ => Category::Shopping,
    }
}

#[async_trait]
impl RemoteBackend for MockBackend {
    async fn list_models(&self) -> Result<Vec<String>, RemoteError> {
        self.preamble().await?;
        Ok(self
            .models
            .clone()
            .unwrap_or_else(|| vec![format!("models/{}", self.model)]))
    }

    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, RemoteError> {
        self.preamble().await?;

        if let Some(raw) = &self.raw_response {
            return Ok(raw.clone());
        }

        let answers: Vec<_> = transaction_line_re()
            .captures_iter(prompt)
            .filter(|caps| !self.omit.contains(&caps[1]))
            .map(|caps| {
                json!({
                    "id": &caps[1],
                    "category": guess_category(&caps[2]).as_str(),
                    "confidence": MOCK_CONFIDENCE,
                })
            })
            .collect();

        if answers.is_empty() && !prompt.contains(TRANSACTION_LINE_PREFIX) {
            // Not a batch prompt (self-test probe)
            return Ok("Hi".to_string());
        }

        Ok(serde_json::Value::Array(answers).to_string())
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        "mock://"
    }

    fn has_credential(&self) -> bool {
        self.has_credential
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteErrorKind;
    use crate::models::Transaction;
    use crate::prompts::build_batch_prompt;

    #[tokio::test]
    async fn test_mock_answers_every_line() {
        let prompt = build_batch_prompt(&[
            Transaction::new("a", "Starbucks", 4.5, "2024-01-01"),
            Transaction::new("b", "Unknown Store", 10.0, "2024-01-01"),
        ]);
        let reply = MockBackend::new()
            .generate(&prompt, &GenerationOptions::classification())
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value[0]["id"], "a");
        assert_eq!(value[0]["category"], "Dining");
        assert_eq!(value[1]["category"], "Shopping");
        assert_eq!(value[1]["confidence"], MOCK_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_mock_omits_ids() {
        let prompt = build_batch_prompt(&[
            Transaction::new("a", "Starbucks", 4.5, "2024-01-01"),
            Transaction::new("b", "Shell", 30.0, "2024-01-01"),
        ]);
        let reply = MockBackend::new()
            .omitting(["a"])
            .generate(&prompt, &GenerationOptions::classification())
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["id"], "b");
    }

    #[tokio::test]
    async fn test_mock_probe_reply() {
        let reply = MockBackend::new()
            .generate("Hello", &GenerationOptions::probe(Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(reply, "Hi");
    }

    #[tokio::test]
    async fn test_mock_failure_and_credential() {
        let err = MockBackend::new()
            .failing(RemoteError::from_status(429, "m", ""))
            .list_models()
            .await
            .unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::QuotaExceeded);

        let err = MockBackend::new()
            .without_credential()
            .generate("Hello", &GenerationOptions::classification())
            .await
            .unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::MissingCredential);
    }

    #[tokio::test]
    async fn test_mock_lists_configured_model() {
        let models = MockBackend::new()
            .with_model("gemini-1.5-pro")
            .list_models()
            .await
            .unwrap();
        assert_eq!(models, vec!["models/gemini-1.5-pro"]);
    }
}
