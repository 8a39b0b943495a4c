//! Working memory — the active context window for the current session
//!
//! TigerStyle: Explicit token budget with a soft limit.
//!
//! Tracks the running conversation and signals when compaction is needed,
//! i.e. when the oldest turns should be summarized and moved to the durable
//! tiers. The budget is soft: exceeding it never fails an append.

use crate::types::estimate_tokens;
use selkie_core::config::WorkingConfig;
use serde::{Deserialize, Serialize};

/// Role of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// Instructions; never compacted away
    System,
    User,
    Assistant,
}

impl TurnRole {
    /// Stable name used in formatting and adapters
    pub fn name(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for TurnRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "system" => Ok(Self::System),
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(format!("unknown turn role: {}", other)),
        }
    }
}

/// A single conversation turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnMessage {
    /// Who produced the turn
    pub role: TurnRole,
    /// Verbatim content
    pub content: String,
    /// Cached token estimate (~4 chars per token)
    pub token_estimate: usize,
}

impl TurnMessage {
    /// Create a new turn with its token estimate
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        let content = content.into();
        let token_estimate = estimate_tokens(&content).max(1);
        Self {
            role,
            content,
            token_estimate,
        }
    }
}

/// Working memory buffer
///
/// Ordered sequence of turns scoped to one session, mutated only by the
/// owning store. Reset by explicit compaction or clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkingMemory {
    /// Configuration
    config: WorkingConfig,
    /// Turns in arrival order
    messages: Vec<TurnMessage>,
}

impl WorkingMemory {
    /// Create a new empty working buffer
    pub fn new(config: WorkingConfig) -> Self {
        Self {
            config,
            messages: Vec::new(),
        }
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self::new(WorkingConfig::default())
    }

    /// Append a turn
    pub fn add_message(&mut self, role: TurnRole, content: impl Into<String>) {
        self.messages.push(TurnMessage::new(role, content));
    }

    /// The current ordered sequence of turns
    pub fn messages(&self) -> &[TurnMessage] {
        &self.messages
    }

    /// Estimated tokens currently held
    pub fn token_count(&self) -> usize {
        self.messages.iter().map(|m| m.token_estimate).sum()
    }

    /// The configured token budget
    pub fn token_budget(&self) -> usize {
        self.config.tokens_budget
    }

    /// Whether the buffer has crossed its compaction threshold
    pub fn needs_compaction(&self) -> bool {
        let trigger =
            (self.config.tokens_budget as f32 * self.config.compaction_threshold) as usize;
        self.token_count() >= trigger
    }

    /// The oldest non-system half of the buffer, the compaction candidates
    ///
    /// Returns clones; call [`drain_oldest`](Self::drain_oldest) once the
    /// summary has been durably stored. Never proposes system turns.
    pub fn compaction_candidates(&self) -> Vec<TurnMessage> {
        let non_system: Vec<&TurnMessage> = self
            .messages
            .iter()
            .filter(|m| m.role != TurnRole::System)
            .collect();

        if non_system.is_empty() {
            return Vec::new();
        }

        let half = (non_system.len() / 2).max(1);
        non_system.into_iter().take(half).cloned().collect()
    }

    /// Remove the n oldest non-system turns
    ///
    /// Returns how many were removed (fewer than n when the buffer runs out).
    pub fn drain_oldest(&mut self, n: usize) -> usize {
        let mut removed = 0;
        self.messages.retain(|m| {
            if removed < n && m.role != TurnRole::System {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }

    /// Number of turns held (including system turns)
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop all turns
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
