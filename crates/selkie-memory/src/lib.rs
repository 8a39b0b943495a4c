//! Selkie Memory
//!
//! Tiered memory for AI agents:
//!
//! - **Working memory**: the active conversation buffer with a soft token
//!   budget and summarize-and-evict compaction.
//! - **Episodic memory**: a durable SQLite log with recency and keyword
//!   lookup and importance-weighted eviction.
//! - **Semantic memory**: a deduplicated local vector index searched by
//!   embedding similarity.
//!
//! [`MemoryStore`] ties the tiers together behind `remember` / `recall` /
//! `get_context`, namespaced by [`AgentId`](selkie_core::AgentId).
//!
//! # Example
//!
//! ```no_run
//! use selkie_core::{AgentId, SelkieConfig};
//! use selkie_memory::MemoryStore;
//!
//! # async fn example() -> selkie_memory::MemoryResult<()> {
//! let store = MemoryStore::open(
//!     AgentId::new("assistant")?,
//!     SelkieConfig::with_persist_dir("/tmp/selkie"),
//! )
//! .await?;
//!
//! store.remember("User's name is Alice", None).await?;
//! let context = store.get_context(Some("user"), None).await?;
//! assert!(context.contains("Alice"));
//! # Ok(())
//! # }
//! ```

pub mod embedder;
pub mod episodic;
pub mod error;
pub mod index;
pub mod record;
pub mod store;
pub mod summarizer;
pub mod types;
pub mod working;

pub use embedder::{Embedder, HashEmbedder, HttpEmbedder};
pub use episodic::EpisodicStore;
pub use error::{MemoryError, MemoryResult};
pub use index::{IndexedMemory, SemanticIndex, StoreOutcome};
pub use record::{EpisodicRecord, Importance, MemoryTier, RecallSource, RecalledMemory};
pub use store::{ExportedRecord, ImportMode, MemoryExport, MemoryStore, MemoryStoreBuilder};
pub use summarizer::{LlmSummarizer, StaticSummarizer, Summarizer, SummarizerConfig};
pub use types::{estimate_tokens, MemoryStats, Timestamp};
pub use working::{TurnMessage, TurnRole, WorkingMemory};
