//! Keyword rules and the offline classifier
//!
//! The rule table is an ordered list of (category, keywords). Lookups walk
//! categories in table order and keywords in list order; the first keyword
//! contained in the transaction text wins.
//!
//! ## Configuration Resolution
//!
//! The table is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/sift/config/rules.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! Once loaded the table is never mutated; share it behind an `Arc`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{Category, ClassificationResult, Provenance, Transaction};

/// Embedded default rules (compiled into binary)
const DEFAULT_RULES: &str = include_str!("../../../config/rules.toml");

/// Confidence assigned to a keyword match
pub const RULE_MATCH_CONFIDENCE: f64 = 0.6;

/// Confidence assigned when nothing matched and the category defaulted to Other
pub const DEFAULT_CONFIDENCE: f64 = 0.2;

/// Keywords that map to one category
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordRule {
    pub category: Category,
    /// Lower-cased, in match order
    pub keywords: Vec<String>,
}

/// Ordered, immutable keyword rule table
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordRuleTable {
    rules: Vec<KeywordRule>,
}

/// On-disk rule file format
#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<RuleEntry>,
}

#[derive(Debug, Deserialize)]
struct RuleEntry {
    category: String,
    #[serde(default)]
    keywords: Vec<String>,
}

impl KeywordRuleTable {
    /// Build a table from explicit rules
    ///
    /// Keywords are lower-cased and blank entries are dropped.
    pub fn new(rules: Vec<KeywordRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| KeywordRule {
                category: rule.category,
                keywords: rule
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
            })
            .collect();
        Self { rules }
    }

    /// The rules that ship with the binary
    pub fn builtin() -> Self {
        Self::from_toml(DEFAULT_RULES).expect("embedded rules.toml is valid")
    }

    /// Parse a rule table from TOML
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: RuleFile = toml::from_str(content)?;
        let mut rules = Vec::with_capacity(file.rules.len());
        for entry in file.rules {
            let category: Category = entry
                .category
                .parse()
                .map_err(|e: String| Error::Config(format!("Invalid rule table: {}", e)))?;
            rules.push(KeywordRule {
                category,
                keywords: entry.keywords,
            });
        }
        Ok(Self::new(rules))
    }

    /// Load the table (override first, then embedded default)
    ///
    /// An explicit path that does not exist is an error; the default
    /// override location is only used when present.
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = override_path {
            let content = fs::read_to_string(path).map_err(|e| {
                Error::Config(format!(
                    "Failed to read rule table {}: {}",
                    path.display(),
                    e
                ))
            })?;
            debug!("Loaded rule table from {}", path.display());
            return Self::from_toml(&content);
        }

        if let Some(default_path) = default_rules_path() {
            if default_path.exists() {
                let content = fs::read_to_string(&default_path)?;
                debug!("Loaded rule table from {}", default_path.display());
                return Self::from_toml(&content);
            }
        }

        Self::from_toml(DEFAULT_RULES)
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Find the first rule keyword contained in `text` (already lower-cased)
    pub fn find_match(&self, text: &str) -> Option<(Category, &str)> {
        self.rules.iter().find_map(|rule| {
            rule.keywords
                .iter()
                .find(|kw| text.contains(kw.as_str()))
                .map(|kw| (rule.category, kw.as_str()))
        })
    }
}

impl Default for KeywordRuleTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Default rule table override path
pub fn default_rules_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("sift").join("config").join("rules.toml"))
}

/// Offline, rule-based classifier
///
/// Pure and total: every transaction gets an answer, no I/O is performed.
#[derive(Debug, Clone, Default)]
pub struct DeterministicClassifier {
    table: Arc<KeywordRuleTable>,
}

impl DeterministicClassifier {
    pub fn new(table: Arc<KeywordRuleTable>) -> Self {
        Self { table }
    }

    pub fn classify(&self, tx: &Transaction) -> ClassificationResult {
        let text = format!(
            "{} {}",
            tx.merchant_name.to_lowercase(),
            tx.description.as_deref().unwrap_or("").to_lowercase()
        );

        match self.table.find_match(&text) {
            Some((category, keyword)) => ClassificationResult {
                id: tx.id.clone(),
                category,
                confidence: RULE_MATCH_CONFIDENCE,
                source: Provenance::Fallback,
                reason: Some(format!("Matched keyword: {}", keyword)),
            },
            None => ClassificationResult {
                id: tx.id.clone(),
                category: Category::Other,
                confidence: DEFAULT_CONFIDENCE,
                source: Provenance::FallbackDefault,
                reason: None,
            },
        }
    }

    pub fn classify_all(&self, transactions: &[Transaction]) -> Vec<ClassificationResult> {
        transactions.iter().map(|tx| self.classify(tx)).collect()
    }
}
