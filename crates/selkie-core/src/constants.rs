//! TigerStyle constants for Selkie
//!
//! All limits are explicit, use big-endian naming (most significant first),
//! and include units in the name.

// =============================================================================
// Agent Limits
// =============================================================================

/// Maximum length of an agent id in bytes
pub const AGENT_ID_LENGTH_BYTES_MAX: usize = 128;

// =============================================================================
// Working Memory Limits
// =============================================================================

/// Default token budget for the working buffer
pub const WORKING_TOKENS_BUDGET_DEFAULT: usize = 4096;

/// Minimum allowed token budget for the working buffer
pub const WORKING_TOKENS_BUDGET_MIN: usize = 256;

/// Default fraction of the budget that triggers compaction
pub const COMPACTION_THRESHOLD_DEFAULT: f32 = 0.8;

/// Rough token estimation: characters per token
pub const TOKEN_ESTIMATE_CHARS_PER_TOKEN: usize = 4;

// =============================================================================
// Episodic Limits
// =============================================================================

/// Default per-agent capacity of the episodic log before eviction
pub const EPISODIC_ENTRIES_COUNT_MAX_DEFAULT: usize = 1000;

/// Minimum allowed episodic capacity
pub const EPISODIC_ENTRIES_COUNT_MIN: usize = 10;

// =============================================================================
// Importance Scores
// =============================================================================

/// Lowest importance score (evicted first)
pub const IMPORTANCE_SCORE_MIN: u8 = 1;

/// Highest importance score (evicted last)
pub const IMPORTANCE_SCORE_MAX: u8 = 10;

/// Default importance for caller-stored memories
pub const IMPORTANCE_SCORE_DEFAULT: u8 = 5;

/// Importance assigned to compaction summaries
pub const IMPORTANCE_SCORE_SUMMARY: u8 = 7;

/// Importance assigned to facts extracted during compaction
pub const IMPORTANCE_SCORE_EXTRACTED_FACT: u8 = 8;

// =============================================================================
// Semantic Index Limits
// =============================================================================

/// Default cosine similarity above which two memories are duplicates
pub const DEDUP_SIMILARITY_MIN_DEFAULT: f32 = 0.92;

/// Default similarity floor for semantic search results
pub const SEARCH_SIMILARITY_MIN_DEFAULT: f32 = 0.3;

// =============================================================================
// Recall / Context Limits
// =============================================================================

/// Default number of memories returned by recall
pub const RECALL_RESULTS_COUNT_DEFAULT: usize = 5;

/// Default token budget for an assembled context string
pub const CONTEXT_TOKENS_BUDGET_DEFAULT: usize = 500;

/// Maximum episodic rows pulled into an export
pub const EXPORT_ROWS_COUNT_MAX: usize = 10_000;

// =============================================================================
// Export Format
// =============================================================================

/// Version tag written into JSON exports
pub const EXPORT_FORMAT_VERSION: &str = "1.0";

// Compile-time assertions for constant validity
const _: () = {
    assert!(IMPORTANCE_SCORE_MIN < IMPORTANCE_SCORE_DEFAULT);
    assert!(IMPORTANCE_SCORE_DEFAULT < IMPORTANCE_SCORE_SUMMARY);
    assert!(IMPORTANCE_SCORE_SUMMARY < IMPORTANCE_SCORE_EXTRACTED_FACT);
    assert!(IMPORTANCE_SCORE_EXTRACTED_FACT <= IMPORTANCE_SCORE_MAX);
    assert!(WORKING_TOKENS_BUDGET_MIN <= WORKING_TOKENS_BUDGET_DEFAULT);
    assert!(EPISODIC_ENTRIES_COUNT_MIN <= EPISODIC_ENTRIES_COUNT_MAX_DEFAULT);
    assert!(TOKEN_ESTIMATE_CHARS_PER_TOKEN > 0);
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_are_fractions() {
        assert!(COMPACTION_THRESHOLD_DEFAULT > 0.0 && COMPACTION_THRESHOLD_DEFAULT <= 1.0);
        assert!(DEDUP_SIMILARITY_MIN_DEFAULT > SEARCH_SIMILARITY_MIN_DEFAULT);
        assert!(DEDUP_SIMILARITY_MIN_DEFAULT <= 1.0);
    }

    #[test]
    fn test_limits_have_units_in_names() {
        // Documents the naming convention: byte limits end in _BYTES_,
        // counts in _COUNT_, token budgets in _TOKENS_.
        let _: usize = AGENT_ID_LENGTH_BYTES_MAX;
        let _: usize = EPISODIC_ENTRIES_COUNT_MAX_DEFAULT;
        let _: usize = WORKING_TOKENS_BUDGET_DEFAULT;
    }
}
