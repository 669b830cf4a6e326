//! Rule table display

use anyhow::Result;
use sift_core::rules::{DEFAULT_CONFIDENCE, RULE_MATCH_CONFIDENCE};
use sift_core::KeywordRuleTable;

/// Print the resolved keyword table in match order
pub fn cmd_rules(table: &KeywordRuleTable) -> Result<()> {
    println!("📋 Keyword rules ({} categories, checked in order)\n", table.len());

    for (i, rule) in table.rules().iter().enumerate() {
        println!("{:>2}. {}", i + 1, rule.category);
        println!("    {}", rule.keywords.join(", "));
    }

    println!();
    println!(
        "Match: confidence {:.1}. No match: Other at {:.1}.",
        RULE_MATCH_CONFIDENCE, DEFAULT_CONFIDENCE
    );
    Ok(())
}
