//! Configuration for Selkie
//!
//! TigerStyle: Explicit defaults, validation, reasonable limits.

use crate::constants::*;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding the persist directory
pub const ENV_PERSIST_DIR: &str = "SELKIE_PERSIST_DIR";

/// Environment variable selecting the default agent namespace
pub const ENV_AGENT_ID: &str = "SELKIE_AGENT_ID";

/// Main configuration for a Selkie memory store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelkieConfig {
    /// Directory holding the episodic database and semantic snapshots
    #[serde(default = "default_persist_dir")]
    pub persist_dir: PathBuf,

    /// Working buffer configuration
    #[serde(default)]
    pub working: WorkingConfig,

    /// Episodic log configuration
    #[serde(default)]
    pub episodic: EpisodicConfig,

    /// Semantic index configuration
    #[serde(default)]
    pub semantic: SemanticConfig,

    /// Automatically compact the working buffer when over threshold
    #[serde(default = "default_true")]
    pub auto_compact: bool,

    /// Extract long-term facts from compacted turns
    #[serde(default = "default_true")]
    pub extract_facts: bool,
}

fn default_true() -> bool {
    true
}

fn default_persist_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".selkie")
}

impl Default for SelkieConfig {
    fn default() -> Self {
        Self {
            persist_dir: default_persist_dir(),
            working: WorkingConfig::default(),
            episodic: EpisodicConfig::default(),
            semantic: SemanticConfig::default(),
            auto_compact: true,
            extract_facts: true,
        }
    }
}

impl SelkieConfig {
    /// Create a configuration rooted at the given persist directory
    pub fn with_persist_dir(persist_dir: impl Into<PathBuf>) -> Self {
        Self {
            persist_dir: persist_dir.into(),
            ..Self::default()
        }
    }

    /// Create from environment variables
    ///
    /// Reads `SELKIE_PERSIST_DIR`; all other settings keep their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dir) = std::env::var_os(ENV_PERSIST_DIR) {
            config.persist_dir = PathBuf::from(dir);
        }
        config
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.working.validate()?;
        self.episodic.validate()?;
        self.semantic.validate()?;
        Ok(())
    }
}

/// Working buffer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingConfig {
    /// Token budget before compaction triggers (soft limit)
    #[serde(default = "default_tokens_budget")]
    pub tokens_budget: usize,

    /// Fraction of the budget at which compaction triggers
    #[serde(default = "default_compaction_threshold")]
    pub compaction_threshold: f32,
}

fn default_tokens_budget() -> usize {
    WORKING_TOKENS_BUDGET_DEFAULT
}

fn default_compaction_threshold() -> f32 {
    COMPACTION_THRESHOLD_DEFAULT
}

impl Default for WorkingConfig {
    fn default() -> Self {
        Self {
            tokens_budget: default_tokens_budget(),
            compaction_threshold: default_compaction_threshold(),
        }
    }
}

impl WorkingConfig {
    fn validate(&self) -> Result<()> {
        if self.tokens_budget < WORKING_TOKENS_BUDGET_MIN {
            return Err(Error::config(
                "working.tokens_budget",
                format!(
                    "{} below minimum {}",
                    self.tokens_budget, WORKING_TOKENS_BUDGET_MIN
                ),
            ));
        }

        if !(0.0..=1.0).contains(&self.compaction_threshold) {
            return Err(Error::config(
                "working.compaction_threshold",
                "must be within 0.0..=1.0",
            ));
        }

        Ok(())
    }
}

/// Episodic log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodicConfig {
    /// Per-agent row capacity before importance-weighted eviction
    #[serde(default = "default_entries_max")]
    pub entries_max: usize,
}

fn default_entries_max() -> usize {
    EPISODIC_ENTRIES_COUNT_MAX_DEFAULT
}

impl Default for EpisodicConfig {
    fn default() -> Self {
        Self {
            entries_max: default_entries_max(),
        }
    }
}

impl EpisodicConfig {
    fn validate(&self) -> Result<()> {
        if self.entries_max < EPISODIC_ENTRIES_COUNT_MIN {
            return Err(Error::config(
                "episodic.entries_max",
                format!(
                    "{} below minimum {}",
                    self.entries_max, EPISODIC_ENTRIES_COUNT_MIN
                ),
            ));
        }
        Ok(())
    }
}

/// Semantic index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticConfig {
    /// Whether to run the pre-insert duplicate check
    #[serde(default = "default_true")]
    pub dedup_enabled: bool,

    /// Cosine similarity above which a candidate is a duplicate
    #[serde(default = "default_dedup_threshold")]
    pub dedup_threshold: f32,

    /// Similarity floor for search results
    #[serde(default = "default_similarity_min")]
    pub similarity_min: f32,
}

fn default_dedup_threshold() -> f32 {
    DEDUP_SIMILARITY_MIN_DEFAULT
}

fn default_similarity_min() -> f32 {
    SEARCH_SIMILARITY_MIN_DEFAULT
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            dedup_enabled: true,
            dedup_threshold: default_dedup_threshold(),
            similarity_min: default_similarity_min(),
        }
    }
}

impl SemanticConfig {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.dedup_threshold) {
            return Err(Error::config(
                "semantic.dedup_threshold",
                "must be within 0.0..=1.0",
            ));
        }

        if self.similarity_min >= self.dedup_threshold {
            return Err(Error::config(
                "semantic.similarity_min",
                "must be below semantic.dedup_threshold",
            ));
        }

        Ok(())
    }
}
