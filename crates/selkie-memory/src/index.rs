//! Semantic memory — deduplicated facts retrieved by similarity
//!
//! TigerStyle: Content-addressed entries with an explicit duplicate gate.
//!
//! In-process vector index with a JSON snapshot per namespace at
//! `<persist_dir>/semantic/<agent_id>.json`. Every mutation persists the
//! snapshot before returning, so a crash never loses an acknowledged write.
//! This tier is a mirror: losing it degrades recall but never loses the
//! canonical episodic copy.

use crate::embedder::{cosine_similarity, Embedder};
use crate::error::{MemoryError, MemoryResult};
use crate::record::Importance;
use crate::types::Timestamp;
use selkie_core::agent::AgentId;
use selkie_core::config::SemanticConfig;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Length of the hex document id (first 8 bytes of the content hash)
const DOC_ID_LENGTH_CHARS: usize = 16;

/// An entry in the semantic index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedMemory {
    /// Content-derived id, stable across processes
    pub doc_id: String,
    /// The remembered content
    pub content: String,
    /// Highest importance seen across merged duplicates
    pub importance: Importance,
    /// When the entry was first indexed
    pub created_at: Timestamp,
    /// Embedding vector from the configured embedder
    pub embedding: Vec<f32>,
}

/// Result of a semantic store: inserted fresh, or merged into a duplicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    /// New entry created under this doc id
    Inserted { doc_id: String },
    /// Existing near-duplicate absorbed the write; its importance was
    /// raised to the max of the two
    Merged { doc_id: String },
}

impl StoreOutcome {
    /// The doc id the content lives under after the store
    pub fn doc_id(&self) -> &str {
        match self {
            Self::Inserted { doc_id } | Self::Merged { doc_id } => doc_id,
        }
    }
}

/// A semantic search hit
#[derive(Debug, Clone)]
pub struct SemanticHit {
    pub content: String,
    pub importance: Importance,
    pub similarity: f32,
}

/// On-disk snapshot format
#[derive(Serialize, Deserialize)]
struct Snapshot {
    model: String,
    entries: Vec<IndexedMemory>,
}

/// Per-namespace semantic index
pub struct SemanticIndex {
    agent_id: AgentId,
    config: SemanticConfig,
    embedder: Arc<dyn Embedder>,
    entries: RwLock<Vec<IndexedMemory>>,
    snapshot_path: PathBuf,
}

impl std::fmt::Debug for SemanticIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticIndex")
            .field("agent_id", &self.agent_id)
            .field("model", &self.embedder.model_name())
            .field("snapshot_path", &self.snapshot_path)
            .finish()
    }
}

impl SemanticIndex {
    /// Open (or create) the semantic index for an agent
    ///
    /// Loads the existing snapshot if one is present. A snapshot written by
    /// a different embedding model is discarded: its vectors are not
    /// comparable, and the episodic log still holds the canonical content.
    #[instrument(skip(config, embedder), fields(agent_id = %agent_id))]
    pub async fn open(
        persist_dir: &Path,
        agent_id: AgentId,
        config: SemanticConfig,
        embedder: Arc<dyn Embedder>,
    ) -> MemoryResult<Self> {
        let snapshot_path = Self::snapshot_path(persist_dir, &agent_id);

        let entries = match tokio::fs::read(&snapshot_path).await {
            Ok(bytes) => {
                let snapshot: Snapshot = serde_json::from_slice(&bytes).map_err(|e| {
                    MemoryError::index(format!(
                        "corrupt snapshot {}: {}",
                        snapshot_path.display(),
                        e
                    ))
                })?;
                if snapshot.model == embedder.model_name() {
                    snapshot.entries
                } else {
                    debug!(
                        agent_id = %agent_id,
                        snapshot_model = %snapshot.model,
                        current_model = %embedder.model_name(),
                        "embedding model changed, starting with an empty index"
                    );
                    Vec::new()
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(agent_id = %agent_id, entries = entries.len(), "semantic index opened");
        Ok(Self {
            agent_id,
            config,
            embedder,
            entries: RwLock::new(entries),
            snapshot_path,
        })
    }

    /// Path of the semantic snapshot for an agent
    pub fn snapshot_path(persist_dir: &Path, agent_id: &AgentId) -> PathBuf {
        persist_dir
            .join("semantic")
            .join(format!("{}.json", agent_id.file_stem()))
    }

    /// Content-derived document id
    pub fn doc_id(content: &str) -> String {
        let digest = Sha256::digest(content.as_bytes());
        hex::encode(digest)[..DOC_ID_LENGTH_CHARS].to_string()
    }

    /// Index a piece of content, deduplicating against existing entries
    ///
    /// Identical content (same hash) and near-duplicates (cosine similarity
    /// at or above the dedup threshold) are merged instead of inserted; the
    /// surviving entry keeps the higher importance. Repeating a store is
    /// therefore idempotent apart from that importance merge.
    #[instrument(skip(self, content), fields(agent_id = %self.agent_id))]
    pub async fn store(
        &self,
        content: &str,
        importance: Importance,
    ) -> MemoryResult<StoreOutcome> {
        let doc_id = Self::doc_id(content);

        // Exact-content fast path: no embedding call needed.
        {
            let mut entries = self.entries.write().await;
            if let Some(existing) = entries.iter_mut().find(|e| e.doc_id == doc_id) {
                existing.importance = existing.importance.max(importance);
                self.persist(&entries).await?;
                debug!(doc_id = %doc_id, "exact duplicate merged");
                return Ok(StoreOutcome::Merged { doc_id });
            }
        }

        let embedding = self.embedder.embed(content).await?;

        let mut entries = self.entries.write().await;
        if self.config.dedup_enabled {
            let duplicate = entries
                .iter_mut()
                .map(|e| {
                    let sim = cosine_similarity(&embedding, &e.embedding);
                    (e, sim)
                })
                .filter(|(_, sim)| *sim >= self.config.dedup_threshold)
                .max_by(|(_, a), (_, b)| a.total_cmp(b));

            if let Some((existing, sim)) = duplicate {
                existing.importance = existing.importance.max(importance);
                let merged_id = existing.doc_id.clone();
                self.persist(&entries).await?;
                debug!(doc_id = %merged_id, similarity = sim, "near duplicate merged");
                return Ok(StoreOutcome::Merged { doc_id: merged_id });
            }
        }

        entries.push(IndexedMemory {
            doc_id: doc_id.clone(),
            content: content.to_string(),
            importance,
            created_at: crate::types::now(),
            embedding,
        });
        self.persist(&entries).await?;

        Ok(StoreOutcome::Inserted { doc_id })
    }

    /// Search by embedding similarity, best match first
    ///
    /// Results below the configured similarity floor are dropped.
    #[instrument(skip(self, query), fields(agent_id = %self.agent_id))]
    pub async fn search(&self, query: &str, limit: usize) -> MemoryResult<Vec<SemanticHit>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;

        let entries = self.entries.read().await;
        let mut hits: Vec<SemanticHit> = entries
            .iter()
            .map(|e| SemanticHit {
                content: e.content.clone(),
                importance: e.importance,
                similarity: cosine_similarity(&query_embedding, &e.embedding),
            })
            .filter(|h| h.similarity >= self.config.similarity_min)
            .collect();
        drop(entries);

        hits.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        hits.truncate(limit);
        Ok(hits)
    }

    /// Number of entries in this namespace
    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Drop all entries and persist the empty index
    #[instrument(skip(self), fields(agent_id = %self.agent_id))]
    pub async fn clear(&self) -> MemoryResult<usize> {
        let mut entries = self.entries.write().await;
        let removed = entries.len();
        entries.clear();
        self.persist(&entries).await?;
        Ok(removed)
    }

    /// Atomically replace the snapshot file (write temp, then rename)
    ///
    /// Callers hold the entries write lock across this call, so persists
    /// are serialized and the snapshot on disk is never older than the
    /// last acknowledged write.
    async fn persist(&self, entries: &[IndexedMemory]) -> MemoryResult<()> {
        let snapshot = Snapshot {
            model: self.embedder.model_name().to_string(),
            entries: entries.to_vec(),
        };
        let bytes = serde_json::to_vec(&snapshot)?;

        if let Some(parent) = self.snapshot_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp_path = self.snapshot_path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, &bytes).await?;
        tokio::fs::rename(&tmp_path, &self.snapshot_path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashEmbedder;

    async fn open_index(dir: &Path, agent: &str) -> SemanticIndex {
        SemanticIndex::open(
            dir,
            AgentId::new(agent).unwrap(),
            SemanticConfig::default(),
            Arc::new(HashEmbedder::default()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_store_and_search() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(dir.path(), "test-agent").await;

        index
            .store("alice lives in amsterdam", Importance::new(8))
            .await
            .unwrap();
        index
            .store("the build uses incremental compilation", Importance::new(5))
            .await
            .unwrap();

        let hits = index.search("who lives in amsterdam", 5).await.unwrap();
        assert!(!hits.is_empty());
        assert_eq!(hits[0].content, "alice lives in amsterdam");
    }

    #[tokio::test]
    async fn test_concurrent_stores_all_land_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let index = Arc::new(open_index(dir.path(), "parallel-agent").await);

        let mut tasks = Vec::new();
        for i in 0..16 {
            let index = Arc::clone(&index);
            tasks.push(tokio::spawn(async move {
                index
                    .store(
                        &format!("unrelated fact number {}", i),
                        Importance::default(),
                    )
                    .await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(index.count().await, 16);

        // The snapshot on disk holds every acknowledged write.
        let reopened = open_index(dir.path(), "parallel-agent").await;
        assert_eq!(reopened.count().await, 16);
    }

    #[tokio::test]
    async fn test_exact_duplicate_merges_importance_max() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(dir.path(), "dedup-agent").await;

        let first = index.store("alice likes rust", Importance::new(4)).await.unwrap();
        assert!(matches!(first, StoreOutcome::Inserted { .. }));

        let second = index.store("alice likes rust", Importance::new(9)).await.unwrap();
        assert!(matches!(second, StoreOutcome::Merged { .. }));
        assert_eq!(first.doc_id(), second.doc_id());
        assert_eq!(index.count().await, 1);

        let hits = index.search("alice likes rust", 1).await.unwrap();
        assert_eq!(hits[0].importance.get(), 9);
    }

    #[tokio::test]
    async fn test_merge_never_lowers_importance() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(dir.path(), "dedup-agent").await;

        index.store("alice likes rust", Importance::new(9)).await.unwrap();
        index.store("alice likes rust", Importance::new(2)).await.unwrap();

        let hits = index.search("alice likes rust", 1).await.unwrap();
        assert_eq!(hits[0].importance.get(), 9);
    }

    #[tokio::test]
    async fn test_distinct_content_both_kept() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(dir.path(), "distinct-agent").await;

        index
            .store("deploys run friday morning", Importance::default())
            .await
            .unwrap();
        index
            .store("alice prefers tabs over spaces", Importance::default())
            .await
            .unwrap();
        assert_eq!(index.count().await, 2);
    }

    #[tokio::test]
    async fn test_similarity_floor_filters_noise() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(dir.path(), "floor-agent").await;

        index
            .store("kubernetes cluster autoscaling limits", Importance::default())
            .await
            .unwrap();

        let hits = index.search("favorite pasta recipe", 5).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let index = open_index(dir.path(), "durable").await;
            index
                .store("persisted fact", Importance::new(7))
                .await
                .unwrap();
        }

        let reopened = open_index(dir.path(), "durable").await;
        assert_eq!(reopened.count().await, 1);
        let hits = reopened.search("persisted fact", 1).await.unwrap();
        assert_eq!(hits[0].importance.get(), 7);
    }

    #[tokio::test]
    async fn test_model_change_resets_index() {
        let dir = tempfile::tempdir().unwrap();
        {
            let index = open_index(dir.path(), "model-agent").await;
            index.store("old vectors", Importance::default()).await.unwrap();
        }

        // Reopen with a different dimension; model_name stays "hashed-bow",
        // so fake a different model by rewriting the snapshot tag.
        let path = SemanticIndex::snapshot_path(dir.path(), &AgentId::new("model-agent").unwrap());
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, text.replace("hashed-bow", "other-model")).unwrap();

        let reopened = open_index(dir.path(), "model-agent").await;
        assert_eq!(reopened.count().await, 0);
    }

    #[tokio::test]
    async fn test_doc_id_is_stable_hash_prefix() {
        let a = SemanticIndex::doc_id("same content");
        let b = SemanticIndex::doc_id("same content");
        let c = SemanticIndex::doc_id("different content");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
    }

    #[tokio::test]
    async fn test_clear() {
        let dir = tempfile::tempdir().unwrap();
        let index = open_index(dir.path(), "clear-agent").await;
        index.store("gone soon", Importance::default()).await.unwrap();
        assert_eq!(index.clear().await.unwrap(), 1);
        assert_eq!(index.count().await, 0);
    }
}
