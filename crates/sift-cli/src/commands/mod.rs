//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (rule table loading, database location)
//! - `classify` - Batch classification from a file
//! - `remote` - Model validation and self-test
//! - `rules` - Rule table display
//! - `serve` - Web server command

pub mod classify;
pub mod core;
pub mod remote;
pub mod rules;
pub mod serve;

// Re-export command functions for main.rs
pub use classify::*;
pub use core::*;
pub use remote::*;
pub use rules::*;
pub use serve::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
