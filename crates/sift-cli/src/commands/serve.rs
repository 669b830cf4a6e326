//! Server command implementation

use std::sync::Arc;

use anyhow::Result;
use sift_core::{ClassifierConfig, KeywordRuleTable};

use super::open_db;

pub async fn cmd_serve(
    config: &ClassifierConfig,
    rules: Arc<KeywordRuleTable>,
    db: Option<&str>,
    host: &str,
    port: u16,
) -> Result<()> {
    // Fatal before anything else: no database location, no server
    let db = open_db(db)?;

    println!("🚀 Starting Sift web server...");
    println!("   Database: {}", db.path());
    println!("   Listening: http://{}:{}", host, port);
    println!("   Model: {}", config.model);
    if config.has_credential() {
        println!("   🔑 GEMINI_API_KEY: set");
    } else {
        println!("   ⚠️  GEMINI_API_KEY not set - every batch will use keyword rules");
    }
    println!("   Keyword rules: {} categories", rules.len());

    let server_config = sift_server::ServerConfig::from_env();
    if !server_config.allowed_origins.is_empty() {
        println!(
            "   🌐 CORS origins: {} (SIFT_ALLOWED_ORIGINS)",
            server_config.allowed_origins.join(", ")
        );
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let state = sift_server::AppState::from_config(db, config, rules);
    sift_server::serve_with_config(state, host, port, server_config).await
}
