//! Memory record types
//!
//! TigerStyle: Explicit types with bounded scores and single-tier ownership.

use crate::types::Timestamp;
use selkie_core::constants::{
    IMPORTANCE_SCORE_DEFAULT, IMPORTANCE_SCORE_MAX, IMPORTANCE_SCORE_MIN,
};
use serde::{Deserialize, Serialize};

/// Bounded importance score biasing eviction order
///
/// 1 (evicted first) through 10 (evicted last). Construction clamps rather
/// than rejects: callers passing 0 or 99 get the nearest valid score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Importance(u8);

impl Importance {
    /// Create an importance score, clamping into the valid range
    pub fn new(score: u8) -> Self {
        Self(score.clamp(IMPORTANCE_SCORE_MIN, IMPORTANCE_SCORE_MAX))
    }

    /// The minimum score
    pub const MIN: Importance = Importance(IMPORTANCE_SCORE_MIN);

    /// The maximum score
    pub const MAX: Importance = Importance(IMPORTANCE_SCORE_MAX);

    /// Get the raw score
    pub fn get(&self) -> u8 {
        debug_assert!((IMPORTANCE_SCORE_MIN..=IMPORTANCE_SCORE_MAX).contains(&self.0));
        self.0
    }

    /// Score normalized into 0.0..=1.0 for ranking against similarities
    pub fn normalized(&self) -> f32 {
        self.0 as f32 / IMPORTANCE_SCORE_MAX as f32
    }
}

impl Default for Importance {
    fn default() -> Self {
        Self(IMPORTANCE_SCORE_DEFAULT)
    }
}

impl From<u8> for Importance {
    fn from(score: u8) -> Self {
        Self::new(score)
    }
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Memory tier a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryTier {
    /// Live in-process conversation buffer
    Working,
    /// Durable, time-ordered record of past interactions
    Episodic,
    /// Durable facts retrieved by similarity
    Semantic,
}

impl MemoryTier {
    /// All tiers, in promotion order
    pub const ALL: [MemoryTier; 3] = [Self::Working, Self::Episodic, Self::Semantic];

    /// Stable name used in CLI arguments and stats
    pub fn name(&self) -> &'static str {
        match self {
            Self::Working => "working",
            Self::Episodic => "episodic",
            Self::Semantic => "semantic",
        }
    }
}

impl std::fmt::Display for MemoryTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A record in the episodic log
///
/// The episodic tier owns the canonical copy of remembered content; the
/// semantic tier may hold a mirror, but never the other way around.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodicRecord {
    /// Row id within the agent's log (assigned by the store)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<i64>,
    /// The remembered content
    pub content: String,
    /// Eviction bias
    pub importance: Importance,
    /// When the record was created
    pub created_at: Timestamp,
    /// Free-form metadata (e.g. {"kind": "compaction_summary"})
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl EpisodicRecord {
    /// Create a new record stamped with the current time
    pub fn new(content: impl Into<String>, importance: Importance) -> Self {
        Self {
            id: None,
            content: content.into(),
            importance,
            created_at: crate::types::now(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Attach a metadata key
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .insert(key.into(), serde_json::Value::String(value.into()));
        self
    }

    /// Metadata kind tag, if present
    pub fn kind(&self) -> Option<&str> {
        self.metadata.get("kind").and_then(|v| v.as_str())
    }
}

/// Which tier produced a recalled memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecallSource {
    Episodic,
    Semantic,
}

/// A memory returned by recall, ranked across tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecalledMemory {
    /// The remembered content
    pub content: String,
    /// Tier the result came from
    pub source: RecallSource,
    /// Ranking score in 0.0..=1.0 (similarity for semantic hits,
    /// normalized importance for episodic ones)
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_importance_clamps() {
        assert_eq!(Importance::new(0).get(), 1);
        assert_eq!(Importance::new(5).get(), 5);
        assert_eq!(Importance::new(200).get(), 10);
    }

    #[test]
    fn test_importance_default_is_midrange() {
        assert_eq!(Importance::default().get(), 5);
    }

    #[test]
    fn test_importance_normalized() {
        assert!((Importance::MAX.normalized() - 1.0).abs() < f32::EPSILON);
        assert!((Importance::new(5).normalized() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_importance_ordering() {
        assert!(Importance::new(3) < Importance::new(7));
        assert_eq!(Importance::MIN.min(Importance::MAX), Importance::MIN);
    }

    #[test]
    fn test_tier_names() {
        assert_eq!(MemoryTier::Working.name(), "working");
        assert_eq!(MemoryTier::Semantic.to_string(), "semantic");
        assert_eq!(MemoryTier::ALL.len(), 3);
    }

    #[test]
    fn test_record_metadata_kind() {
        let record = EpisodicRecord::new("summary of earlier turns", Importance::new(7))
            .with_metadata("kind", "compaction_summary");
        assert_eq!(record.kind(), Some("compaction_summary"));
    }

    #[test]
    fn test_record_serde_roundtrip() {
        let record = EpisodicRecord::new("User's name is Alice", Importance::new(8));
        let json = serde_json::to_string(&record).unwrap();
        let back: EpisodicRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.content, record.content);
        assert_eq!(back.importance, record.importance);
        assert_eq!(back.created_at, record.created_at);
    }
}
