//! Agent identity for Selkie
//!
//! TigerStyle: Explicit types, validated on construction.

use crate::constants::AGENT_ID_LENGTH_BYTES_MAX;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace key partitioning all memory tiers
///
/// Every memory record belongs to exactly one agent; lookups never cross
/// agent boundaries.
///
/// # TigerStyle
/// - Explicit validation on construction
/// - Immutable after creation
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Create a new AgentId with validation
    ///
    /// # Errors
    /// Returns an error if the id is empty, exceeds the length limit, or
    /// contains characters outside `[A-Za-z0-9._-]`.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();

        if id.is_empty() {
            return Err(Error::InvalidAgentId {
                id,
                reason: "must not be empty".into(),
            });
        }

        if id.len() > AGENT_ID_LENGTH_BYTES_MAX {
            return Err(Error::AgentIdTooLong {
                length: id.len(),
                limit: AGENT_ID_LENGTH_BYTES_MAX,
            });
        }

        // Agent ids become file names and SQL parameters; keep the charset tight.
        let valid = id
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.');
        if !valid {
            return Err(Error::InvalidAgentId {
                id,
                reason: "contains invalid characters".into(),
            });
        }

        Ok(Self(id))
    }

    /// Get the id as a string reference
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File stem used for this agent's on-disk artifacts
    pub fn file_stem(&self) -> &str {
        debug_assert!(!self.0.is_empty());
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
