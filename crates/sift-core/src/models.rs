//! Data models for Sift

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RemoteError;

/// A transaction submitted for classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub merchant_name: String,
    pub amount: f64,
    /// ISO-8601 or YYYY-MM-DD, passed through as-is
    pub date: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Accepted from callers but not used when classifying
    #[serde(default)]
    pub category_hint: Option<String>,
}

impl Transaction {
    pub fn new(id: &str, merchant_name: &str, amount: f64, date: &str) -> Self {
        Self {
            id: id.to_string(),
            merchant_name: merchant_name.to_string(),
            amount,
            date: date.to_string(),
            description: None,
            category_hint: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Spending category (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Dining,
    Groceries,
    Travel,
    Gas,
    #[serde(rename = "Online Shopping")]
    OnlineShopping,
    Entertainment,
    Utilities,
    Rent,
    Subscriptions,
    Healthcare,
    Shopping,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dining => "Dining",
            Self::Groceries => "Groceries",
            Self::Travel => "Travel",
            Self::Gas => "Gas",
            Self::OnlineShopping => "Online Shopping",
            Self::Entertainment => "Entertainment",
            Self::Utilities => "Utilities",
            Self::Rent => "Rent",
            Self::Subscriptions => "Subscriptions",
            Self::Healthcare => "Healthcare",
            Self::Shopping => "Shopping",
            Self::Other => "Other",
        }
    }

    /// All categories, in the order they are offered to the model
    pub fn all() -> &'static [Category] {
        &[
            Self::Dining,
            Self::Groceries,
            Self::Travel,
            Self::Gas,
            Self::OnlineShopping,
            Self::Entertainment,
            Self::Utilities,
            Self::Rent,
            Self::Subscriptions,
            Self::Healthcare,
            Self::Shopping,
            Self::Other,
        ]
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::all()
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// Which strategy produced a classification result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Answered by the remote model
    Remote,
    /// Matched a keyword rule
    Fallback,
    /// No keyword matched; category defaulted to Other
    FallbackDefault,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Fallback => "fallback",
            Self::FallbackDefault => "fallback_default",
        }
    }

    pub fn is_fallback(&self) -> bool {
        !matches!(self, Self::Remote)
    }
}

/// Classification of a single transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub id: String,
    pub category: Category,
    /// Always within 0.0-1.0
    pub confidence: f64,
    pub source: Provenance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Advisory batch-level tag; per-result `source` is authoritative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    /// Every result came from the remote model
    Remote,
    /// Some results remote, some rescued by keyword rules
    Mixed,
    /// Every result came from keyword rules
    Fallback,
}

impl BatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Mixed => "mixed",
            Self::Fallback => "fallback",
        }
    }
}

/// Structured reason for degradation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorDescriptor {
    pub const PARTIAL_MATCH: &'static str = "partial-match";

    pub fn partial_match(missing: usize, total: usize) -> Self {
        Self {
            code: Self::PARTIAL_MATCH.to_string(),
            message: format!(
                "{} of {} transactions missing from remote response",
                missing, total
            ),
            status: None,
        }
    }
}

impl From<&RemoteError> for ErrorDescriptor {
    fn from(err: &RemoteError) -> Self {
        Self {
            code: err.kind.as_str().to_string(),
            message: err.message.clone(),
            status: err.status,
        }
    }
}

impl From<RemoteError> for ErrorDescriptor {
    fn from(err: RemoteError) -> Self {
        Self::from(&err)
    }
}

/// Result of classifying a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub ok: bool,
    pub mode: BatchMode,
    /// One entry per input transaction, in input order
    pub categories: Vec<ClassificationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDescriptor>,
}

impl BatchResponse {
    /// Number of results that came from the fallback path
    pub fn fallback_count(&self) -> usize {
        self.categories
            .iter()
            .filter(|r| r.source.is_fallback())
            .count()
    }
}

/// Request body for batch classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizeRequest {
    pub transactions: Vec<Transaction>,
}

/// Outcome of checking whether the configured model can be used
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub ok: bool,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDescriptor>,
    /// Model names reported by the service, when the listing succeeded
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available: Vec<String>,
    pub checked_at: DateTime<Utc>,
}

impl ValidationResult {
    pub fn passed(model: &str) -> Self {
        Self {
            ok: true,
            model: model.to_string(),
            error: None,
            available: vec![],
            checked_at: Utc::now(),
        }
    }

    pub fn unavailable(model: &str, err: &RemoteError) -> Self {
        Self {
            ok: false,
            model: model.to_string(),
            error: Some(err.into()),
            available: vec![],
            checked_at: Utc::now(),
        }
    }

    pub fn error_kind(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.code.as_str())
    }
}

/// Self-test step that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStep {
    Validation,
    Generation,
}

impl ProbeStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Generation => "generation",
        }
    }
}

/// End-to-end health probe report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfTestReport {
    pub ok: bool,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<ProbeStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<BatchMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl SelfTestReport {
    pub fn passed(model: &str) -> Self {
        Self {
            ok: true,
            model: model.to_string(),
            step: None,
            code: None,
            status: None,
            error: None,
            mode: Some(BatchMode::Remote),
            details: Some("Self-test passed".to_string()),
            checked_at: Utc::now(),
        }
    }

    pub fn failed(model: &str, step: ProbeStep, err: &ErrorDescriptor) -> Self {
        Self {
            ok: false,
            model: model.to_string(),
            step: Some(step),
            code: Some(err.code.clone()),
            status: err.status,
            error: Some(err.message.clone()),
            mode: None,
            details: None,
            checked_at: Utc::now(),
        }
    }
}
