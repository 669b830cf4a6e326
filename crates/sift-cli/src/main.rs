//! Sift CLI - Transaction classifier
//!
//! Usage:
//!   sift serve --port 8000          Start web server
//!   sift classify --file batch.csv  Classify a batch of transactions
//!   sift validate                   Check API key and model availability
//!   sift selftest                   End-to-end probe of the remote model
//!   sift rules                      Show the keyword rule table

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use sift_core::{ClassificationRouter, ClassifierConfig, RemoteClient};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = ClassifierConfig::from_env();

    match cli.command {
        Commands::Serve { port, host, db } => {
            let rules = commands::load_rules(cli.rules.as_deref())?;
            commands::cmd_serve(&config, rules, db.as_deref(), &host, port).await
        }
        Commands::Classify {
            file,
            offline,
            json,
        } => {
            let rules = commands::load_rules(cli.rules.as_deref())?;
            let router = ClassificationRouter::from_config(&config, rules);
            commands::cmd_classify(&router, &file, offline, json).await
        }
        Commands::Validate { json } => {
            commands::cmd_validate(&RemoteClient::from_config(&config), json).await
        }
        Commands::Selftest { json } => {
            commands::cmd_selftest(&RemoteClient::from_config(&config), config.probe_timeout, json)
                .await
        }
        Commands::Rules => {
            let rules = commands::load_rules(cli.rules.as_deref())?;
            commands::cmd_rules(&rules)
        }
    }
}
