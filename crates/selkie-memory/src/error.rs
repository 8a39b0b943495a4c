//! Error types for the memory system
//!
//! TigerStyle: Explicit error variants with context.

use selkie_core::error::Error as CoreError;
use thiserror::Error;

/// Result type for memory operations
pub type MemoryResult<T> = std::result::Result<T, MemoryError>;

/// Memory system errors
#[derive(Error, Debug)]
pub enum MemoryError {
    /// Episodic log failure (must-succeed tier; callers see these)
    #[error("episodic store failed: {reason}")]
    Episodic { reason: String },

    /// Embedding generation failure (optional tier; usually skipped over)
    #[error("embedding failed: {reason}")]
    Embedding { reason: String },

    /// Semantic index failure
    #[error("semantic index failed: {reason}")]
    Index { reason: String },

    /// Summarization failure (compaction is skipped on this)
    #[error("summarization failed: {reason}")]
    Summarization { reason: String },

    /// Import rejected or malformed
    #[error("import failed: {reason}")]
    Import { reason: String },

    /// Serialization error
    #[error("serialization failed: {reason}")]
    SerializationFailed { reason: String },

    /// Deserialization error
    #[error("deserialization failed: {reason}")]
    DeserializationFailed { reason: String },

    /// Invalid configuration
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Internal error
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl MemoryError {
    /// Create an episodic failure
    pub fn episodic(reason: impl Into<String>) -> Self {
        Self::Episodic {
            reason: reason.into(),
        }
    }

    /// Create an embedding failure
    pub fn embedding(reason: impl Into<String>) -> Self {
        Self::Embedding {
            reason: reason.into(),
        }
    }

    /// Create a semantic index failure
    pub fn index(reason: impl Into<String>) -> Self {
        Self::Index {
            reason: reason.into(),
        }
    }

    /// Create a summarization failure
    pub fn summarization(reason: impl Into<String>) -> Self {
        Self::Summarization {
            reason: reason.into(),
        }
    }

    /// Create an import failure
    pub fn import(reason: impl Into<String>) -> Self {
        Self::Import {
            reason: reason.into(),
        }
    }

    /// Whether the failed step is optional and may be skipped
    ///
    /// Optional steps: semantic mirroring, dedup, compaction. Episodic
    /// writes and import/export are not skippable.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::Embedding { .. } | Self::Index { .. } | Self::Summarization { .. }
        )
    }
}

impl From<CoreError> for MemoryError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidConfiguration { field, reason } => Self::InvalidConfig {
                reason: format!("{}: {}", field, reason),
            },
            CoreError::SerializationFailed { reason } => Self::SerializationFailed { reason },
            CoreError::DeserializationFailed { reason } => Self::DeserializationFailed { reason },
            other => Self::Internal {
                reason: other.to_string(),
            },
        }
    }
}

impl From<rusqlite::Error> for MemoryError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Episodic {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for MemoryError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationFailed {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for MemoryError {
    fn from(err: std::io::Error) -> Self {
        Self::Index {
            reason: err.to_string(),
        }
    }
}
