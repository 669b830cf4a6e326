//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Sift - Classify transactions with an LLM and keyword fallback
#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Transaction classifier with deterministic fallback", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Keyword rule file (overrides ~/.local/share/sift/config/rules.toml)
    #[arg(long, global = true)]
    pub rules: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Database location (overrides DATABASE_URL)
        #[arg(long)]
        db: Option<String>,
    },

    /// Classify transactions from a CSV or JSON file
    Classify {
        /// File to read (CSV with an id,merchant_name,amount,date header, or JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// Skip the remote model and use keyword rules only
        #[arg(long)]
        offline: bool,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the API key and model availability
    Validate {
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the model and run a minimal generation call
    Selftest {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved keyword rule table
    Rules,
}
