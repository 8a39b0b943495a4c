//! Common types for the memory system
//!
//! TigerStyle: Explicit types with clear semantics.

use chrono::{DateTime, Utc};
use selkie_core::constants::TOKEN_ESTIMATE_CHARS_PER_TOKEN;
use serde::{Deserialize, Serialize};

/// Timestamp type for memory operations
///
/// Uses UTC to avoid timezone ambiguity.
pub type Timestamp = DateTime<Utc>;

/// Returns the current timestamp
pub fn now() -> Timestamp {
    Utc::now()
}

/// Rough token estimate for a piece of text
///
/// Uses the ~4 characters per token heuristic; always at least 1 for
/// non-empty text so empty-message pathologies cannot hide tokens.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    (text.len() / TOKEN_ESTIMATE_CHARS_PER_TOKEN).max(1)
}

/// Statistics about memory usage across tiers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Messages currently held in the working buffer
    pub working_message_count: usize,
    /// Estimated tokens in the working buffer
    pub working_token_count: usize,
    /// Working buffer token budget
    pub working_token_budget: usize,
    /// Whether the working buffer is over its compaction threshold
    pub working_needs_compaction: bool,
    /// Rows in the episodic log for this agent
    pub episodic_entry_count: usize,
    /// Entries in the semantic index for this agent
    pub semantic_entry_count: usize,
}

impl MemoryStats {
    /// Working buffer utilization as a fraction (0.0 - 1.0+)
    pub fn working_utilization(&self) -> f64 {
        if self.working_token_budget == 0 {
            return 0.0;
        }
        self.working_token_count as f64 / self.working_token_budget as f64
    }

    /// Total durable entries across episodic and semantic tiers
    pub fn durable_entries(&self) -> usize {
        self.episodic_entry_count + self.semantic_entry_count
    }
}
