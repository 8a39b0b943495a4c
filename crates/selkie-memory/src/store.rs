//! MemoryStore — the orchestrating facade over all three tiers
//!
//! TigerStyle: One owner per tier, explicit degradation rules.
//!
//! `remember`/`recall`/`get_context` are the long-term API; `add_message`
//! and `compact` drive the working buffer. Episodic writes must succeed;
//! the semantic mirror, dedup, and compaction degrade to "skip with a
//! warning" when their external dependency fails.

use crate::embedder::{Embedder, HashEmbedder};
use crate::episodic::EpisodicStore;
use crate::error::{MemoryError, MemoryResult};
use crate::index::SemanticIndex;
use crate::record::{EpisodicRecord, Importance, MemoryTier, RecallSource, RecalledMemory};
use crate::summarizer::{LlmSummarizer, Summarizer};
use crate::types::{estimate_tokens, MemoryStats, Timestamp};
use crate::working::{TurnRole, WorkingMemory};
use selkie_core::agent::AgentId;
use selkie_core::config::SelkieConfig;
use selkie_core::constants::{
    CONTEXT_TOKENS_BUDGET_DEFAULT, EXPORT_FORMAT_VERSION, EXPORT_ROWS_COUNT_MAX,
    IMPORTANCE_SCORE_EXTRACTED_FACT, IMPORTANCE_SCORE_SUMMARY, RECALL_RESULTS_COUNT_DEFAULT,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Fixed header of an assembled context block
pub const CONTEXT_HEADER: &str = "[Memory Context]";

/// Metadata kind tag on compaction summaries
pub const KIND_COMPACTION_SUMMARY: &str = "compaction_summary";

/// Metadata kind tag on facts extracted during compaction
pub const KIND_EXTRACTED_FACT: &str = "extracted_fact";

/// How an import treats existing rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportMode {
    /// Clear the namespace first
    #[default]
    Replace,
    /// Append to whatever is already there
    Merge,
}

/// A portable dump of an agent's episodic memory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryExport {
    /// Format version, currently "1.0"
    pub version: String,
    /// Namespace the dump was taken from
    pub agent_id: String,
    /// When the dump was taken
    pub exported_at: Timestamp,
    /// Episodic records, oldest first
    pub episodic: Vec<ExportedRecord>,
}

/// One record inside a [`MemoryExport`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedRecord {
    pub content: String,
    pub importance: Importance,
    pub created_at: Timestamp,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl From<EpisodicRecord> for ExportedRecord {
    fn from(record: EpisodicRecord) -> Self {
        Self {
            content: record.content,
            importance: record.importance,
            created_at: record.created_at,
            metadata: record.metadata,
        }
    }
}

/// Builder for [`MemoryStore`]
pub struct MemoryStoreBuilder {
    agent_id: AgentId,
    config: SelkieConfig,
    embedder: Option<Arc<dyn Embedder>>,
    summarizer: Option<Arc<dyn Summarizer>>,
}

impl MemoryStoreBuilder {
    /// Override the configuration (default: [`SelkieConfig::default`])
    pub fn config(mut self, config: SelkieConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the embedder (default: the local [`HashEmbedder`])
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Provide a summarizer for compaction
    ///
    /// Without one (and with no provider key in the environment), compaction
    /// is skipped and the working buffer simply exceeds its soft limit.
    pub fn summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = Some(summarizer);
        self
    }

    /// Validate the configuration and open all tiers
    pub async fn open(self) -> MemoryResult<MemoryStore> {
        self.config.validate()?;

        let embedder = self
            .embedder
            .unwrap_or_else(|| Arc::new(HashEmbedder::default()));
        let summarizer = self
            .summarizer
            .or_else(|| LlmSummarizer::from_env().map(|s| Arc::new(s) as Arc<dyn Summarizer>));

        let episodic = EpisodicStore::open(
            &self.config.persist_dir,
            self.agent_id.clone(),
            self.config.episodic.clone(),
        )
        .await?;
        let semantic = SemanticIndex::open(
            &self.config.persist_dir,
            self.agent_id.clone(),
            self.config.semantic.clone(),
            embedder,
        )
        .await?;
        let working = WorkingMemory::new(self.config.working.clone());

        info!(agent_id = %self.agent_id, persist_dir = %self.config.persist_dir.display(), "memory store opened");
        Ok(MemoryStore {
            agent_id: self.agent_id,
            config: self.config,
            working: Mutex::new(working),
            episodic,
            semantic,
            summarizer,
        })
    }
}

/// Tiered memory store for one agent namespace
pub struct MemoryStore {
    agent_id: AgentId,
    config: SelkieConfig,
    working: Mutex<WorkingMemory>,
    episodic: EpisodicStore,
    semantic: SemanticIndex,
    summarizer: Option<Arc<dyn Summarizer>>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("agent_id", &self.agent_id)
            .field("persist_dir", &self.config.persist_dir)
            .field("has_summarizer", &self.summarizer.is_some())
            .finish()
    }
}

impl MemoryStore {
    /// Start building a store for the given namespace
    pub fn builder(agent_id: AgentId) -> MemoryStoreBuilder {
        MemoryStoreBuilder {
            agent_id,
            config: SelkieConfig::default(),
            embedder: None,
            summarizer: None,
        }
    }

    /// Open with the given configuration and all other defaults
    pub async fn open(agent_id: AgentId, config: SelkieConfig) -> MemoryResult<Self> {
        Self::builder(agent_id).config(config).open().await
    }

    /// The namespace this store serves
    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    // -------------------------------------------------------------------
    // Long-term memory
    // -------------------------------------------------------------------

    /// Store a fact in long-term memory
    ///
    /// The episodic write is canonical and must succeed. The semantic
    /// mirror is best-effort: an embedding or index failure logs a warning
    /// and the fact remains reachable through episodic lookups.
    #[instrument(skip(self, content), fields(agent_id = %self.agent_id))]
    pub async fn remember(
        &self,
        content: &str,
        importance: Option<Importance>,
    ) -> MemoryResult<i64> {
        let importance = importance.unwrap_or_default();
        let row_id = self
            .episodic
            .store(EpisodicRecord::new(content, importance))
            .await?;

        if let Err(e) = self.semantic.store(content, importance).await {
            if e.is_skippable() {
                warn!(error = %e, "semantic mirror skipped");
            } else {
                return Err(e);
            }
        }

        Ok(row_id)
    }

    /// Retrieve up to `limit` memories relevant to `query`
    ///
    /// Merges semantic similarity hits with episodic keyword hits, dedups
    /// by content, and ranks by score (similarity for semantic results,
    /// normalized importance for episodic ones).
    #[instrument(skip(self, query), fields(agent_id = %self.agent_id))]
    pub async fn recall(&self, query: &str, limit: usize) -> MemoryResult<Vec<RecalledMemory>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut results: Vec<RecalledMemory> = Vec::new();

        match self.semantic.search(query, limit).await {
            Ok(hits) => {
                results.extend(hits.into_iter().map(|h| RecalledMemory {
                    content: h.content,
                    source: RecallSource::Semantic,
                    score: h.similarity,
                }));
            }
            Err(e) if e.is_skippable() => {
                warn!(error = %e, "semantic recall leg skipped");
            }
            Err(e) => return Err(e),
        }

        let episodic_hits = self.episodic.search(query, limit).await?;
        results.extend(episodic_hits.into_iter().map(|r| RecalledMemory {
            content: r.content,
            source: RecallSource::Episodic,
            score: r.importance.normalized(),
        }));

        results.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut seen: HashSet<String> = HashSet::new();
        results.retain(|m| seen.insert(m.content.clone()));
        results.truncate(limit);
        Ok(results)
    }

    /// Assemble a prompt-ready context block for `query`
    ///
    /// Bullet list under a `[Memory Context]` header, cut off at
    /// `max_tokens` estimated tokens. Without a query, falls back to the
    /// most recent episodic records. Returns an empty string when nothing
    /// relevant is stored.
    #[instrument(skip(self, query), fields(agent_id = %self.agent_id))]
    pub async fn get_context(
        &self,
        query: Option<&str>,
        max_tokens: Option<usize>,
    ) -> MemoryResult<String> {
        let max_tokens = max_tokens.unwrap_or(CONTEXT_TOKENS_BUDGET_DEFAULT);

        let contents: Vec<String> = match query {
            Some(q) => self
                .recall(q, RECALL_RESULTS_COUNT_DEFAULT)
                .await?
                .into_iter()
                .map(|m| m.content)
                .collect(),
            None => self
                .episodic
                .recent(RECALL_RESULTS_COUNT_DEFAULT)
                .await?
                .into_iter()
                .map(|r| r.content)
                .collect(),
        };

        if contents.is_empty() {
            return Ok(String::new());
        }

        let mut block = CONTEXT_HEADER.to_string();
        let mut tokens = estimate_tokens(&block);
        for content in contents {
            let line = format!("\n- {}", content);
            let line_tokens = estimate_tokens(&line);
            if tokens + line_tokens > max_tokens {
                break;
            }
            block.push_str(&line);
            tokens += line_tokens;
        }

        // Budget too small for even one bullet: treat as nothing relevant.
        if block == CONTEXT_HEADER {
            return Ok(String::new());
        }
        Ok(block)
    }

    // -------------------------------------------------------------------
    // Working buffer
    // -------------------------------------------------------------------

    /// Append a conversation turn
    ///
    /// With `auto_compact` enabled (the default), crossing the compaction
    /// threshold triggers [`compact`](Self::compact). Returns whether a
    /// compaction ran.
    #[instrument(skip(self, content), fields(agent_id = %self.agent_id))]
    pub async fn add_message(
        &self,
        role: TurnRole,
        content: impl Into<String>,
    ) -> MemoryResult<bool> {
        let over_threshold = {
            let mut working = self.working.lock().await;
            working.add_message(role, content);
            working.needs_compaction()
        };

        if over_threshold && self.config.auto_compact {
            return self.compact().await;
        }
        Ok(false)
    }

    /// The current working-buffer turns, oldest first
    pub async fn messages(&self) -> Vec<crate::working::TurnMessage> {
        self.working.lock().await.messages().to_vec()
    }

    /// Summarize and evict the oldest non-system half of the buffer
    ///
    /// The summary lands in the episodic tier at importance 7. When fact
    /// extraction is enabled, durable facts from the compacted turns are
    /// stored via [`remember`](Self::remember) at importance 8. Returns
    /// `Ok(false)` when there is nothing to compact or the summarizer is
    /// missing or failing (the buffer is left intact).
    #[instrument(skip(self), fields(agent_id = %self.agent_id))]
    pub async fn compact(&self) -> MemoryResult<bool> {
        let Some(summarizer) = self.summarizer.as_ref() else {
            warn!("no summarizer configured, compaction skipped");
            return Ok(false);
        };

        // Hold the buffer lock across the whole pass so no turn can slip
        // between candidate selection and eviction.
        let mut working = self.working.lock().await;
        let candidates = working.compaction_candidates();
        if candidates.is_empty() {
            return Ok(false);
        }

        let summary = match summarizer.summarize(&candidates).await {
            Ok(summary) => summary,
            Err(e) if e.is_skippable() => {
                warn!(error = %e, "summarization failed, compaction skipped");
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        let record = EpisodicRecord::new(&summary, Importance::new(IMPORTANCE_SCORE_SUMMARY))
            .with_metadata("kind", KIND_COMPACTION_SUMMARY);
        self.episodic.store(record).await?;

        // Drain as soon as the summary is durable: a failure in the fact
        // writes below must not leave the turns behind for a retry to
        // summarize (and store) a second time.
        let drained = working.drain_oldest(candidates.len());
        debug!(
            drained,
            remaining_tokens = working.token_count(),
            "working buffer compacted"
        );

        if self.config.extract_facts {
            match summarizer.extract_facts(&candidates).await {
                Ok(facts) => {
                    for fact in facts {
                        let importance = Importance::new(IMPORTANCE_SCORE_EXTRACTED_FACT);
                        let record = EpisodicRecord::new(&fact, importance)
                            .with_metadata("kind", KIND_EXTRACTED_FACT);
                        self.episodic.store(record).await?;
                        if let Err(e) = self.semantic.store(&fact, importance).await {
                            if e.is_skippable() {
                                warn!(error = %e, "semantic mirror skipped for extracted fact");
                            } else {
                                return Err(e);
                            }
                        }
                    }
                }
                Err(e) if e.is_skippable() => {
                    warn!(error = %e, "fact extraction failed, facts skipped");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(true)
    }

    // -------------------------------------------------------------------
    // Maintenance
    // -------------------------------------------------------------------

    /// Usage counters across all tiers
    pub async fn stats(&self) -> MemoryResult<MemoryStats> {
        let (message_count, token_count, token_budget, needs_compaction) = {
            let working = self.working.lock().await;
            (
                working.len(),
                working.token_count(),
                working.token_budget(),
                working.needs_compaction(),
            )
        };

        Ok(MemoryStats {
            working_message_count: message_count,
            working_token_count: token_count,
            working_token_budget: token_budget,
            working_needs_compaction: needs_compaction,
            episodic_entry_count: self.episodic.count().await?,
            semantic_entry_count: self.semantic.count().await,
        })
    }

    /// Wipe the given tiers for this namespace
    #[instrument(skip(self), fields(agent_id = %self.agent_id))]
    pub async fn clear(&self, tiers: &[MemoryTier]) -> MemoryResult<()> {
        for tier in tiers {
            match tier {
                MemoryTier::Working => self.working.lock().await.clear(),
                MemoryTier::Episodic => {
                    self.episodic.clear().await?;
                }
                MemoryTier::Semantic => {
                    self.semantic.clear().await?;
                }
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------
    // Export / import
    // -------------------------------------------------------------------

    /// Dump this namespace's episodic memory
    ///
    /// The semantic tier is not exported: its entries mirror episodic
    /// content and its vectors are embedder-specific.
    #[instrument(skip(self), fields(agent_id = %self.agent_id))]
    pub async fn export(&self) -> MemoryResult<MemoryExport> {
        let records = self.episodic.all_records(EXPORT_ROWS_COUNT_MAX).await?;
        Ok(MemoryExport {
            version: EXPORT_FORMAT_VERSION.to_string(),
            agent_id: self.agent_id.as_str().to_string(),
            exported_at: crate::types::now(),
            episodic: records.into_iter().map(ExportedRecord::from).collect(),
        })
    }

    /// Dump this namespace's episodic memory as pretty-printed JSON
    pub async fn export_json(&self) -> MemoryResult<String> {
        let export = self.export().await?;
        Ok(serde_json::to_string_pretty(&export)?)
    }

    /// Load records from a dump, preserving timestamps and metadata
    ///
    /// Returns how many records were written. `Replace` clears the
    /// episodic and semantic tiers first; `Merge` appends.
    #[instrument(skip(self, export), fields(agent_id = %self.agent_id))]
    pub async fn import(&self, export: MemoryExport, mode: ImportMode) -> MemoryResult<usize> {
        if export.version != EXPORT_FORMAT_VERSION {
            return Err(MemoryError::import(format!(
                "unsupported format version {:?} (expected {:?})",
                export.version, EXPORT_FORMAT_VERSION
            )));
        }

        if export.agent_id != self.agent_id.as_str() {
            debug!(
                from = %export.agent_id,
                into = %self.agent_id,
                "importing records across namespaces"
            );
        }

        if mode == ImportMode::Replace {
            self.episodic.clear().await?;
            self.semantic.clear().await?;
        }

        let mut written = 0;
        for record in export.episodic {
            self.episodic
                .store(EpisodicRecord {
                    id: None,
                    content: record.content,
                    importance: record.importance,
                    created_at: record.created_at,
                    metadata: record.metadata,
                })
                .await?;
            written += 1;
        }

        info!(written, ?mode, "import finished");
        Ok(written)
    }

    /// Load records from a JSON dump string
    pub async fn import_json(&self, json: &str, mode: ImportMode) -> MemoryResult<usize> {
        let export: MemoryExport = serde_json::from_str(json)
            .map_err(|e| MemoryError::import(format!("malformed export: {}", e)))?;
        self.import(export, mode).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarizer::{FailingSummarizer, StaticSummarizer};
    use crate::working::TurnMessage;
    use async_trait::async_trait;
    use selkie_core::config::WorkingConfig;
    use std::path::Path;

    /// Summarizes fine, but every fact write path blows up non-skippably
    struct BrokenFactsSummarizer;

    #[async_trait]
    impl Summarizer for BrokenFactsSummarizer {
        async fn summarize(&self, _messages: &[TurnMessage]) -> MemoryResult<String> {
            Ok("summary of the compacted turns".to_string())
        }

        async fn extract_facts(&self, _messages: &[TurnMessage]) -> MemoryResult<Vec<String>> {
            Err(MemoryError::Internal {
                reason: "fact store unavailable".to_string(),
            })
        }
    }

    fn test_config(dir: &Path) -> SelkieConfig {
        let mut config = SelkieConfig::with_persist_dir(dir);
        config.working = WorkingConfig {
            tokens_budget: 256,
            compaction_threshold: 0.8,
        };
        config
    }

    async fn open_store(dir: &Path, agent: &str) -> MemoryStore {
        MemoryStore::builder(AgentId::new(agent).unwrap())
            .config(test_config(dir))
            .summarizer(Arc::new(StaticSummarizer::new()))
            .open()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_remember_reaches_both_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), "both-tiers").await;

        store.remember("alice prefers rust", None).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.episodic_entry_count, 1);
        assert_eq!(stats.semantic_entry_count, 1);
    }

    #[tokio::test]
    async fn test_recall_merges_and_dedups() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), "recall-agent").await;

        // Reaches both tiers, so recall sees it twice before dedup.
        store
            .remember("alice prefers rust", Some(Importance::new(8)))
            .await
            .unwrap();

        let results = store.recall("alice rust", 5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "alice prefers rust");
    }

    #[tokio::test]
    async fn test_recall_caps_results() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), "cap-agent").await;

        for i in 0..10 {
            store
                .remember(&format!("note {} about the deploy", i), None)
                .await
                .unwrap();
        }

        let results = store.recall("deploy", 3).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_get_context_contains_remembered_fact() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), "context-agent").await;

        store
            .remember("User's name is Alice", Some(Importance::new(8)))
            .await
            .unwrap();

        let context = store.get_context(Some("user"), None).await.unwrap();
        assert!(context.starts_with(CONTEXT_HEADER));
        assert!(context.contains("Alice"));
    }

    #[tokio::test]
    async fn test_get_context_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), "empty-agent").await;
        let context = store.get_context(Some("anything"), None).await.unwrap();
        assert_eq!(context, "");
    }

    #[tokio::test]
    async fn test_get_context_without_query_uses_recent() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), "recent-agent").await;

        store.remember("standup moved to 9am", None).await.unwrap();

        let context = store.get_context(None, None).await.unwrap();
        assert!(context.contains("standup moved to 9am"));
    }

    #[tokio::test]
    async fn test_get_context_respects_token_budget() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), "budget-agent").await;

        for i in 0..5 {
            store
                .remember(&format!("deploy note {}: {}", i, "d".repeat(200)), None)
                .await
                .unwrap();
        }

        let context = store.get_context(Some("deploy note"), Some(80)).await.unwrap();
        assert!(estimate_tokens(&context) <= 80);
        assert!(context.contains("deploy note"));
    }

    #[tokio::test]
    async fn test_auto_compaction_shrinks_buffer_and_stores_summary() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), "compact-agent").await;

        // Budget 256, threshold 0.8 → trigger at ~205 tokens. Each turn is
        // 200 chars = 50 tokens.
        let mut compacted = false;
        for i in 0..6 {
            let turn = format!("{} {}", i, "w".repeat(198));
            compacted |= store.add_message(TurnRole::User, turn).await.unwrap();
        }
        assert!(compacted);

        let stats = store.stats().await.unwrap();
        assert!(stats.working_token_count < stats.working_token_budget);
        assert!(stats.episodic_entry_count >= 1);

        let recent = store.episodic.recent(10).await.unwrap();
        assert!(recent
            .iter()
            .any(|r| r.kind() == Some(KIND_COMPACTION_SUMMARY)));
    }

    #[tokio::test]
    async fn test_compaction_extracts_facts() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::builder(AgentId::new("facts-agent").unwrap())
            .config(test_config(dir.path()))
            .summarizer(Arc::new(StaticSummarizer::with_facts(vec![
                "User's name is Alice".to_string(),
            ])))
            .open()
            .await
            .unwrap();

        store.add_message(TurnRole::User, "my name is Alice").await.unwrap();
        store.add_message(TurnRole::Assistant, "hi Alice").await.unwrap();
        assert!(store.compact().await.unwrap());

        let facts = store.episodic.search("Alice", 10).await.unwrap();
        assert!(facts
            .iter()
            .any(|r| r.kind() == Some(KIND_EXTRACTED_FACT)
                && r.importance.get() == IMPORTANCE_SCORE_EXTRACTED_FACT));
    }

    #[tokio::test]
    async fn test_failed_summarization_skips_compaction() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::builder(AgentId::new("fail-agent").unwrap())
            .config(test_config(dir.path()))
            .summarizer(Arc::new(FailingSummarizer))
            .open()
            .await
            .unwrap();

        store
            .add_message(TurnRole::User, "x".repeat(2000))
            .await
            .unwrap();

        // Buffer is intact and over budget; nothing reached episodic.
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.working_message_count, 1);
        assert!(stats.working_needs_compaction);
        assert_eq!(stats.episodic_entry_count, 0);
    }

    #[tokio::test]
    async fn test_failed_fact_write_still_drains_compacted_turns() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::builder(AgentId::new("broken-facts").unwrap())
            .config(test_config(dir.path()))
            .summarizer(Arc::new(BrokenFactsSummarizer))
            .open()
            .await
            .unwrap();

        store.add_message(TurnRole::User, "first turn").await.unwrap();
        store.add_message(TurnRole::Assistant, "second turn").await.unwrap();

        // Fact extraction fails non-skippably, but the summarized turns
        // are already gone: a retry cannot summarize them a second time.
        assert!(store.compact().await.is_err());

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.working_message_count, 1);

        let summaries: Vec<_> = store
            .episodic
            .recent(10)
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.kind() == Some(KIND_COMPACTION_SUMMARY))
            .collect();
        assert_eq!(summaries.len(), 1);
    }

    #[tokio::test]
    async fn test_compact_without_summarizer_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        // Make sure no provider key sneaks in from the environment.
        std::env::remove_var("ANTHROPIC_API_KEY");
        std::env::remove_var("OPENAI_API_KEY");
        let store = MemoryStore::builder(AgentId::new("bare-agent").unwrap())
            .config(test_config(dir.path()))
            .open()
            .await
            .unwrap();

        store.add_message(TurnRole::User, "hello").await.unwrap();
        assert!(!store.compact().await.unwrap());
        assert_eq!(store.messages().await.len(), 1);
    }

    #[tokio::test]
    async fn test_export_import_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let source = open_store(dir.path(), "source-agent").await;

        source
            .remember("first fact", Some(Importance::new(3)))
            .await
            .unwrap();
        source
            .remember("second fact", Some(Importance::new(9)))
            .await
            .unwrap();

        let json = source.export_json().await.unwrap();

        let target = open_store(dir.path(), "target-agent").await;
        let written = target
            .import_json(&json, ImportMode::Replace)
            .await
            .unwrap();
        assert_eq!(written, 2);

        let original = source.episodic.all_records(100).await.unwrap();
        let imported = target.episodic.all_records(100).await.unwrap();
        assert_eq!(original.len(), imported.len());
        for (a, b) in original.iter().zip(imported.iter()) {
            assert_eq!(a.content, b.content);
            assert_eq!(a.importance, b.importance);
            assert_eq!(a.created_at, b.created_at);
            assert_eq!(a.metadata, b.metadata);
        }
    }

    #[tokio::test]
    async fn test_import_merge_appends() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), "merge-agent").await;
        store.remember("existing", None).await.unwrap();

        let export = MemoryExport {
            version: EXPORT_FORMAT_VERSION.to_string(),
            agent_id: "elsewhere".to_string(),
            exported_at: crate::types::now(),
            episodic: vec![ExportedRecord {
                content: "imported".to_string(),
                importance: Importance::default(),
                created_at: crate::types::now(),
                metadata: serde_json::Map::new(),
            }],
        };

        store.import(export, ImportMode::Merge).await.unwrap();
        assert_eq!(store.episodic.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_import_rejects_unknown_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), "version-agent").await;

        let export = MemoryExport {
            version: "9.9".to_string(),
            agent_id: "x".to_string(),
            exported_at: crate::types::now(),
            episodic: Vec::new(),
        };

        let err = store.import(export, ImportMode::Replace).await.unwrap_err();
        assert!(matches!(err, MemoryError::Import { .. }));
    }

    #[tokio::test]
    async fn test_namespace_isolation_across_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let alpha = open_store(dir.path(), "alpha").await;
        let beta = open_store(dir.path(), "beta").await;

        alpha.remember("alpha secret plan", None).await.unwrap();

        assert!(beta.recall("alpha secret plan", 5).await.unwrap().is_empty());
        let beta_stats = beta.stats().await.unwrap();
        assert_eq!(beta_stats.durable_entries(), 0);
    }

    #[tokio::test]
    async fn test_clear_selected_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(dir.path(), "clear-tiers").await;

        store.remember("durable", None).await.unwrap();
        store.add_message(TurnRole::User, "hello").await.unwrap();

        store.clear(&[MemoryTier::Working, MemoryTier::Semantic]).await.unwrap();
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.working_message_count, 0);
        assert_eq!(stats.semantic_entry_count, 0);
        assert_eq!(stats.episodic_entry_count, 1);
    }
}
