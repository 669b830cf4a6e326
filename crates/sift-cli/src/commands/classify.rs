//! Batch classification command

use std::path::Path;

use anyhow::{Context, Result};
use sift_core::models::BatchResponse;
use sift_core::{load_transactions, ClassificationRouter, Transaction};

use super::truncate;

/// Classify every transaction in `file` and print the results
pub async fn cmd_classify(
    router: &ClassificationRouter,
    file: &Path,
    offline: bool,
    json: bool,
) -> Result<()> {
    let transactions = load_transactions(file)
        .with_context(|| format!("Failed to read transactions from {}", file.display()))?;

    let response = classify(router, &transactions, offline).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_table(&transactions, &response);
    }
    Ok(())
}

/// Route a batch, or classify it with keyword rules only when `offline`
pub async fn classify(
    router: &ClassificationRouter,
    transactions: &[Transaction],
    offline: bool,
) -> BatchResponse {
    if offline {
        router.categorize_offline(transactions)
    } else {
        router.categorize_batch(transactions).await
    }
}

fn print_table(transactions: &[Transaction], response: &BatchResponse) {
    println!(
        "🏷️  Classified {} transactions (mode: {})\n",
        response.categories.len(),
        response.mode.as_str()
    );

    println!(
        "{:<12} {:<28} {:<16} {:>6}  {:<16} Reason",
        "ID", "Merchant", "Category", "Conf", "Source"
    );
    println!("{}", "-".repeat(96));

    for (tx, result) in transactions.iter().zip(&response.categories) {
        println!(
            "{:<12} {:<28} {:<16} {:>6.2}  {:<16} {}",
            truncate(&result.id, 12),
            truncate(&tx.merchant_name, 28),
            result.category.as_str(),
            result.confidence,
            result.source.as_str(),
            result.reason.as_deref().unwrap_or("")
        );
    }

    if let Some(error) = &response.error {
        println!();
        println!("⚠️  {}: {}", error.code, error.message);
    }

    let rescued = response.fallback_count();
    if rescued > 0 {
        println!(
            "\n   {} of {} answered by keyword rules",
            rescued,
            response.categories.len()
        );
    }
}
