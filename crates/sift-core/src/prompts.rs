//! Prompt construction for remote classification
//!
//! One prompt covers a whole batch: every transaction is listed on its own
//! line together with the closed category set, and the model is asked for a
//! JSON array keyed by transaction id.

use crate::models::{Category, Transaction};

/// Prompt sent by the self-test generation step
pub const SELF_TEST_PROMPT: &str = "Hello";

/// Prefix of each transaction line in a batch prompt
pub const TRANSACTION_LINE_PREFIX: &str = "- ID: ";

/// Render one transaction as a prompt line
pub fn transaction_line(tx: &Transaction) -> String {
    format!(
        "{}{} | Merchant: {} | Amount: ${} | Desc: {}",
        TRANSACTION_LINE_PREFIX,
        tx.id,
        tx.merchant_name,
        tx.amount,
        tx.description.as_deref().unwrap_or("")
    )
}

/// Build the batch classification prompt
pub fn build_batch_prompt(transactions: &[Transaction]) -> String {
    let categories = Category::all()
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let tx_block = transactions
        .iter()
        .map(transaction_line)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a financial transaction classifier.\n\
         Valid Categories: {}\n\
         \n\
         Transactions:\n\
         {}\n\
         \n\
         Task: Classify each transaction.\n\
         Return JSON Array ONLY: [{{ \"id\": \"tx_id\", \"category\": \"CategoryName\", \"confidence\": 0.95 }}]\n",
        categories, tx_block
    )
}
