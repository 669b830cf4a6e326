//! Remote backend types
//!
//! These types are backend-agnostic and used across all remote implementations.

use std::time::Duration;

use crate::models::Category;

/// One usable entry from a remote batch reply
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteAnswer {
    pub id: String,
    pub category: Category,
    /// Clamped to 0.0-1.0
    pub confidence: f64,
}

/// Options for a single generation call
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    /// Cap on generated tokens (the self-test uses a tiny budget)
    pub max_output_tokens: Option<u32>,
    /// Ask the service for `application/json` output
    pub json_response: bool,
    /// Per-call bound; `None` uses the backend's batch timeout
    pub timeout: Option<Duration>,
}

impl GenerationOptions {
    /// Options used for batch classification
    pub fn classification() -> Self {
        Self {
            max_output_tokens: None,
            json_response: true,
            timeout: None,
        }
    }

    /// Options used by the self-test generation step
    pub fn probe(timeout: Duration) -> Self {
        Self {
            max_output_tokens: Some(5),
            json_response: false,
            timeout: Some(timeout),
        }
    }
}
