//! Episodic memory — durable, time-ordered log of past interactions
//!
//! TigerStyle: Bounded capacity with deterministic eviction.
//!
//! Backed by a per-namespace SQLite database under the persist directory.
//! Writes to this tier must succeed; unlike the semantic mirror there is no
//! skip-on-failure path. When a namespace exceeds its row capacity, the
//! lowest-importance rows go first, oldest-first within equal importance.

use crate::error::{MemoryError, MemoryResult};
use crate::record::{EpisodicRecord, Importance};
use crate::types::Timestamp;
use rusqlite::{params, Connection};
use selkie_core::agent::AgentId;
use selkie_core::config::EpisodicConfig;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument, warn};

/// Durable episodic log for one agent namespace
///
/// All public methods are async; SQLite calls run on the blocking thread
/// pool so the caller's executor is never stalled by disk I/O.
#[derive(Debug, Clone)]
pub struct EpisodicStore {
    agent_id: AgentId,
    config: EpisodicConfig,
    conn: Arc<Mutex<Connection>>,
}

impl EpisodicStore {
    /// Open (or create) the episodic database for an agent
    ///
    /// The database lives at `<persist_dir>/<agent_id>_episodic.db`.
    #[instrument(skip(config), fields(agent_id = %agent_id))]
    pub async fn open(
        persist_dir: &Path,
        agent_id: AgentId,
        config: EpisodicConfig,
    ) -> MemoryResult<Self> {
        let db_path = Self::db_path(persist_dir, &agent_id);
        let dir = persist_dir.to_path_buf();

        let conn = tokio::task::spawn_blocking(move || -> MemoryResult<Connection> {
            std::fs::create_dir_all(&dir)
                .map_err(|e| MemoryError::episodic(format!("create {}: {}", dir.display(), e)))?;
            let conn = Connection::open(&db_path)?;
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS memories (
                     id          INTEGER PRIMARY KEY AUTOINCREMENT,
                     agent_id    TEXT    NOT NULL,
                     content     TEXT    NOT NULL,
                     metadata    TEXT    NOT NULL DEFAULT '{}',
                     created_at  INTEGER NOT NULL,
                     importance  INTEGER NOT NULL
                 );
                 CREATE INDEX IF NOT EXISTS idx_memories_agent_time
                     ON memories (agent_id, created_at DESC);
                 CREATE INDEX IF NOT EXISTS idx_memories_agent_eviction
                     ON memories (agent_id, importance ASC, created_at ASC);",
            )?;
            Ok(conn)
        })
        .await
        .map_err(join_error)??;

        debug!(agent_id = %agent_id, "episodic store opened");
        Ok(Self {
            agent_id,
            config,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Path of the episodic database for an agent
    pub fn db_path(persist_dir: &Path, agent_id: &AgentId) -> PathBuf {
        persist_dir.join(format!("{}_episodic.db", agent_id.file_stem()))
    }

    /// The namespace this store serves
    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Insert a record, evicting past capacity, and return its row id
    #[instrument(skip(self, record), fields(agent_id = %self.agent_id))]
    pub async fn store(&self, record: EpisodicRecord) -> MemoryResult<i64> {
        let conn = Arc::clone(&self.conn);
        let agent = self.agent_id.as_str().to_string();
        let entries_max = self.config.entries_max;

        let (row_id, evicted) = tokio::task::spawn_blocking(move || -> MemoryResult<(i64, usize)> {
            let conn = conn.lock().map_err(lock_error)?;
            let metadata = serde_json::to_string(&record.metadata)?;
            conn.execute(
                "INSERT INTO memories (agent_id, content, metadata, created_at, importance)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    agent,
                    record.content,
                    metadata,
                    record.created_at.timestamp_micros(),
                    record.importance.get(),
                ],
            )?;
            let row_id = conn.last_insert_rowid();

            let count: usize = conn.query_row(
                "SELECT COUNT(*) FROM memories WHERE agent_id = ?1",
                params![agent],
                |row| row.get(0),
            )?;

            let mut evicted = 0;
            if count > entries_max {
                let excess = count - entries_max;
                evicted = conn.execute(
                    "DELETE FROM memories WHERE id IN (
                         SELECT id FROM memories WHERE agent_id = ?1
                         ORDER BY importance ASC, created_at ASC, id ASC
                         LIMIT ?2
                     )",
                    params![agent, excess],
                )?;
            }

            Ok((row_id, evicted))
        })
        .await
        .map_err(join_error)??;

        if evicted > 0 {
            warn!(
                agent_id = %self.agent_id,
                evicted,
                capacity = entries_max,
                "episodic log over capacity, evicted lowest-importance rows"
            );
        }
        Ok(row_id)
    }

    /// The most recent records, newest first
    #[instrument(skip(self), fields(agent_id = %self.agent_id))]
    pub async fn recent(&self, limit: usize) -> MemoryResult<Vec<EpisodicRecord>> {
        self.query(
            "SELECT id, content, metadata, created_at, importance FROM memories
             WHERE agent_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2",
            limit,
            None,
        )
        .await
    }

    /// Keyword search, most important first, ties broken newest first
    #[instrument(skip(self), fields(agent_id = %self.agent_id))]
    pub async fn search(&self, keyword: &str, limit: usize) -> MemoryResult<Vec<EpisodicRecord>> {
        self.query(
            "SELECT id, content, metadata, created_at, importance FROM memories
             WHERE agent_id = ?1 AND content LIKE '%' || ?3 || '%'
             ORDER BY importance DESC, created_at DESC, id DESC
             LIMIT ?2",
            limit,
            Some(keyword.to_string()),
        )
        .await
    }

    /// All records in insertion order, oldest first (export order)
    #[instrument(skip(self), fields(agent_id = %self.agent_id))]
    pub async fn all_records(&self, limit: usize) -> MemoryResult<Vec<EpisodicRecord>> {
        self.query(
            "SELECT id, content, metadata, created_at, importance FROM memories
             WHERE agent_id = ?1
             ORDER BY created_at ASC, id ASC
             LIMIT ?2",
            limit,
            None,
        )
        .await
    }

    /// Number of rows in this namespace
    pub async fn count(&self) -> MemoryResult<usize> {
        let conn = Arc::clone(&self.conn);
        let agent = self.agent_id.as_str().to_string();

        tokio::task::spawn_blocking(move || -> MemoryResult<usize> {
            let conn = conn.lock().map_err(lock_error)?;
            let count = conn.query_row(
                "SELECT COUNT(*) FROM memories WHERE agent_id = ?1",
                params![agent],
                |row| row.get(0),
            )?;
            Ok(count)
        })
        .await
        .map_err(join_error)?
    }

    /// Delete every row in this namespace, returning how many were removed
    #[instrument(skip(self), fields(agent_id = %self.agent_id))]
    pub async fn clear(&self) -> MemoryResult<usize> {
        let conn = Arc::clone(&self.conn);
        let agent = self.agent_id.as_str().to_string();

        tokio::task::spawn_blocking(move || -> MemoryResult<usize> {
            let conn = conn.lock().map_err(lock_error)?;
            let removed = conn.execute(
                "DELETE FROM memories WHERE agent_id = ?1",
                params![agent],
            )?;
            Ok(removed)
        })
        .await
        .map_err(join_error)?
    }

    async fn query(
        &self,
        sql: &'static str,
        limit: usize,
        keyword: Option<String>,
    ) -> MemoryResult<Vec<EpisodicRecord>> {
        let conn = Arc::clone(&self.conn);
        let agent = self.agent_id.as_str().to_string();

        tokio::task::spawn_blocking(move || -> MemoryResult<Vec<EpisodicRecord>> {
            let conn = conn.lock().map_err(lock_error)?;
            let mut stmt = conn.prepare(sql)?;

            let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<RawRow> {
                Ok(RawRow {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    metadata: row.get(2)?,
                    created_at_micros: row.get(3)?,
                    importance: row.get(4)?,
                })
            };

            let rows: Vec<RawRow> = match keyword {
                Some(kw) => stmt
                    .query_map(params![agent, limit, kw], map_row)?
                    .collect::<rusqlite::Result<_>>()?,
                None => stmt
                    .query_map(params![agent, limit], map_row)?
                    .collect::<rusqlite::Result<_>>()?,
            };

            rows.into_iter().map(RawRow::into_record).collect()
        })
        .await
        .map_err(join_error)?
    }
}

/// Row as stored, before JSON and timestamp decoding
struct RawRow {
    id: i64,
    content: String,
    metadata: String,
    created_at_micros: i64,
    importance: u8,
}

impl RawRow {
    fn into_record(self) -> MemoryResult<EpisodicRecord> {
        let created_at: Timestamp = chrono::DateTime::from_timestamp_micros(self.created_at_micros)
            .ok_or_else(|| {
                MemoryError::episodic(format!(
                    "row {} has invalid timestamp {}",
                    self.id, self.created_at_micros
                ))
            })?;

        // Tolerate corrupt metadata rather than losing the row
        let metadata = serde_json::from_str(&self.metadata).unwrap_or_else(|_| {
            warn!(row_id = self.id, "unreadable metadata, treating as empty");
            serde_json::Map::new()
        });

        Ok(EpisodicRecord {
            id: Some(self.id),
            content: self.content,
            importance: Importance::new(self.importance),
            created_at,
            metadata,
        })
    }
}

fn join_error(e: tokio::task::JoinError) -> MemoryError {
    MemoryError::Internal {
        reason: format!("blocking task failed: {}", e),
    }
}

fn lock_error<T>(_: std::sync::PoisonError<T>) -> MemoryError {
    MemoryError::Internal {
        reason: "episodic connection lock poisoned".to_string(),
    }
}
