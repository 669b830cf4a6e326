//! Shared command utilities
//!
//! This module contains:
//! - `load_rules` - Resolve the keyword rule table
//! - `resolve_db_location` / `open_db` - Find and open the database

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use sift_core::db::{Database, DATABASE_URL_ENV};
use sift_core::KeywordRuleTable;

/// Load the rule table (explicit file, then data-dir override, then built-in)
pub fn load_rules(path: Option<&Path>) -> Result<Arc<KeywordRuleTable>> {
    let table = KeywordRuleTable::load(path).context("Failed to load keyword rules")?;
    Ok(Arc::new(table))
}

/// Pick the database location: `--db` flag first, then `DATABASE_URL`
pub fn resolve_db_location(flag: Option<&str>, env: Option<String>) -> Result<String> {
    flag.map(str::to_string)
        .or(env)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .with_context(|| format!("No database configured: set {} or pass --db", DATABASE_URL_ENV))
}

/// Open the database named by `--db` or `DATABASE_URL`
pub fn open_db(flag: Option<&str>) -> Result<Database> {
    let location = resolve_db_location(flag, std::env::var(DATABASE_URL_ENV).ok())?;
    Database::new(&location).with_context(|| format!("Failed to open database {}", location))
}
