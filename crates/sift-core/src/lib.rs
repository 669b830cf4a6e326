//! Sift Core Library
//!
//! Transaction classification with an LLM and a deterministic fallback:
//! - Data model shared by the server and CLI
//! - Keyword rule table and the offline classifier
//! - Remote classification client (Gemini, plus a mock for tests)
//! - Router that merges remote answers with offline rescues
//! - Self-test probe for operational health
//! - Database connectivity pool and transaction file import

pub mod ai;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod models;
pub mod probe;
pub mod prompts;
pub mod router;
pub mod rules;

/// Test utilities including mock Gemini server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{GeminiBackend, GenerationOptions, MockBackend, RemoteAnswer, RemoteBackend, RemoteClient};
pub use config::ClassifierConfig;
pub use db::Database;
pub use error::{Error, RemoteError, RemoteErrorKind, Result};
pub use import::{load_transactions, parse_transactions_csv, parse_transactions_json};
pub use models::{
    BatchMode, BatchResponse, CategorizeRequest, Category, ClassificationResult, ErrorDescriptor,
    ProbeStep, Provenance, SelfTestReport, Transaction, ValidationResult,
};
pub use probe::run_self_test;
pub use router::ClassificationRouter;
pub use rules::{DeterministicClassifier, KeywordRule, KeywordRuleTable};
