//! Transaction file readers for the CLI
//!
//! CSV files use the header `id,merchant_name,amount,date,description,category_hint`
//! (extra columns ignored, the last two optional). JSON files hold either a
//! bare array of transactions or a `{"transactions": [...]}` request body.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{CategorizeRequest, Transaction};

/// Parse transactions from CSV
pub fn parse_transactions_csv<R: Read>(reader: R) -> Result<Vec<Transaction>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let id_col = column("id").ok_or_else(|| missing_column("id"))?;
    let merchant_col = column("merchant_name").ok_or_else(|| missing_column("merchant_name"))?;
    let amount_col = column("amount").ok_or_else(|| missing_column("amount"))?;
    let date_col = column("date").ok_or_else(|| missing_column("date"))?;
    let description_col = column("description");
    let hint_col = column("category_hint");

    let mut transactions = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        // Header is line 1
        let line = row + 2;

        let id = required(&record, id_col, "id", line)?;
        let merchant_name = required(&record, merchant_col, "merchant_name", line)?;
        let amount = parse_amount(required(&record, amount_col, "amount", line)?)
            .map_err(|e| Error::InvalidData(format!("line {}: {}", line, e)))?;
        let date = record.get(date_col).unwrap_or("").to_string();

        transactions.push(Transaction {
            id: id.to_string(),
            merchant_name: merchant_name.to_string(),
            amount,
            date,
            description: optional(&record, description_col),
            category_hint: optional(&record, hint_col),
        });
    }

    ensure_unique_ids(&transactions)?;
    debug!("Parsed {} CSV transactions", transactions.len());
    Ok(transactions)
}

/// Parse transactions from JSON (array or `{"transactions": [...]}`)
pub fn parse_transactions_json(content: &str) -> Result<Vec<Transaction>> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Payload {
        List(Vec<Transaction>),
        Request(CategorizeRequest),
    }

    let transactions = match serde_json::from_str::<Payload>(content) {
        Ok(Payload::List(list)) => list,
        Ok(Payload::Request(req)) => req.transactions,
        // Re-parse as a list to surface serde's error for the common shape
        Err(_) => serde_json::from_str::<Vec<Transaction>>(content)?,
    };

    ensure_unique_ids(&transactions)?;
    debug!("Parsed {} JSON transactions", transactions.len());
    Ok(transactions)
}

/// Load transactions from a file, picking the format from its extension
pub fn load_transactions(path: &Path) -> Result<Vec<Transaction>> {
    let content = std::fs::read_to_string(path)?;

    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or_else(|| content.trim_start().starts_with(['[', '{']));

    if is_json {
        parse_transactions_json(&content)
    } else {
        parse_transactions_csv(content.as_bytes())
    }
}

fn missing_column(name: &str) -> Error {
    Error::InvalidData(format!("CSV is missing required column '{}'", name))
}

fn required<'r>(record: &'r StringRecord, col: usize, name: &str, line: usize) -> Result<&'r str> {
    record
        .get(col)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::InvalidData(format!("line {}: missing {}", line, name)))
}

fn optional(record: &StringRecord, col: Option<usize>) -> Option<String> {
    col.and_then(|c| record.get(c))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parse an amount string, handling currency symbols and commas
fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .replace(['$', ',', ' '], "")
        .replace('(', "-")
        .replace(')', "");

    cleaned
        .parse::<f64>()
        .map_err(|_| Error::InvalidData(format!("Unable to parse amount: {}", s)))
}

/// Transaction ids must be unique within a batch
fn ensure_unique_ids(transactions: &[Transaction]) -> Result<()> {
    let mut seen = HashSet::with_capacity(transactions.len());
    for tx in transactions {
        if !seen.insert(tx.id.as_str()) {
            return Err(Error::InvalidData(format!(
                "Duplicate transaction id: {}",
                tx.id
            )));
        }
    }
    Ok(())
}
