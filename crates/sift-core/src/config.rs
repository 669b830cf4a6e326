//! Classifier configuration
//!
//! Loaded once at startup and never mutated. Environment variables:
//! - `GEMINI_API_KEY`: API key (optional; without it every batch uses the offline classifier)
//! - `GEMINI_MODEL`: Model name (default: gemini-2.0-flash)
//! - `GEMINI_BASE_URL`: API base (default: https://generativelanguage.googleapis.com/v1beta)
//! - `SIFT_BATCH_TIMEOUT_SECS`: Bound on one batch classification call (default: 10)
//! - `SIFT_VALIDATION_TIMEOUT_SECS`: Bound on the model listing call (default: 10)
//! - `SIFT_PROBE_TIMEOUT_SECS`: Bound on the self-test generation call (default: 5)

use std::time::Duration;

use tracing::warn;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Remote classifier settings
#[derive(Clone)]
pub struct ClassifierConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub batch_timeout: Duration,
    pub validation_timeout: Duration,
    pub probe_timeout: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            batch_timeout: Duration::from_secs(10),
            validation_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(5),
        }
    }
}

// Keep the key out of logs
impl std::fmt::Debug for ClassifierConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("batch_timeout", &self.batch_timeout)
            .field("validation_timeout", &self.validation_timeout)
            .field("probe_timeout", &self.probe_timeout)
            .finish()
    }
}

impl ClassifierConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create from an arbitrary variable lookup (used by tests)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            api_key: non_empty("GEMINI_API_KEY"),
            model: non_empty("GEMINI_MODEL").unwrap_or(defaults.model),
            base_url: non_empty("GEMINI_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            batch_timeout: secs_var(&non_empty, "SIFT_BATCH_TIMEOUT_SECS")
                .unwrap_or(defaults.batch_timeout),
            validation_timeout: secs_var(&non_empty, "SIFT_VALIDATION_TIMEOUT_SECS")
                .unwrap_or(defaults.validation_timeout),
            probe_timeout: secs_var(&non_empty, "SIFT_PROBE_TIMEOUT_SECS")
                .unwrap_or(defaults.probe_timeout),
        }
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Builder-style override of the API key
    pub fn with_api_key(mut self, api_key: &str) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    /// Builder-style override of the base URL
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

fn secs_var<F>(lookup: &F, key: &str) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.parse::<u64>() {
        Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
        _ => {
            warn!(var = key, value = %raw, "Ignoring invalid timeout, using default");
            None
        }
    }
}
