//! Remote model commands (validate, selftest)

use std::time::Duration;

use anyhow::{bail, Result};
use chrono::Local;
use sift_core::ai::{RemoteBackend, RemoteClient};
use sift_core::run_self_test;

/// Check the API key and that the configured model is listed
pub async fn cmd_validate(client: &RemoteClient, json: bool) -> Result<()> {
    let result = client.validate_model_availability().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("🔍 Validating Gemini model...\n");
        println!("  Host:  {}", client.host());
        println!("  Model: {}", result.model);
        println!(
            "  Checked: {}",
            result.checked_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        );
        println!();

        match &result.error {
            None => println!("✅ Model available"),
            Some(error) => {
                println!("❌ {} ({})", error.message, error.code);
                if !result.available.is_empty() {
                    println!("\n  Models visible to this key:");
                    for name in result.available.iter().take(10) {
                        println!("    - {}", name);
                    }
                    if result.available.len() > 10 {
                        println!("    ... and {} more", result.available.len() - 10);
                    }
                }
            }
        }
    }

    if !result.ok {
        bail!("Model {} is not available", result.model);
    }
    Ok(())
}

/// Validate the model, then issue one tiny generation call
pub async fn cmd_selftest(client: &RemoteClient, probe_timeout: Duration, json: bool) -> Result<()> {
    let report = run_self_test(client, probe_timeout).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("🩺 Running self-test against {}...\n", report.model);
        if report.ok {
            println!(
                "✅ {}",
                report.details.as_deref().unwrap_or("Self-test passed")
            );
        } else {
            let step = report.step.map(|s| s.as_str()).unwrap_or("unknown");
            println!("❌ Failed at {} step", step);
            if let Some(code) = &report.code {
                println!("   Code:   {}", code);
            }
            if let Some(status) = report.status {
                println!("   Status: {}", status);
            }
            if let Some(error) = &report.error {
                println!("   Error:  {}", error);
            }
        }
    }

    if !report.ok {
        bail!("Self-test failed");
    }
    Ok(())
}
