// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed store for memories and conversation history.
//!
//! Embeddings live in BLOB columns and are scanned brute-force for vector
//! search. FTS5 external-content tables, kept in sync by triggers, serve
//! keyword search with bm25 ranking.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mnemo_core::MnemoError;
use mnemo_storage::{Database, map_tr_err};
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::queries::Queries;
use crate::types::{
    HistoryItem, HistorySearchResult, MemoryFtsResult, MemoryItem, MemorySource, SearchResult,
};
use crate::vector::{bytes_to_vector, dot_product, normalize, vector_to_bytes};

/// Persistent store for memories and history.
///
/// Cloning is cheap; clones share the same single-writer connection.
#[derive(Clone)]
pub struct MemoryStore {
    conn: Connection,
    queries: Arc<Queries>,
}

impl MemoryStore {
    /// Wrap a connection that already has the memory schema applied.
    pub fn new(conn: Connection) -> Result<Self, MnemoError> {
        Ok(Self {
            conn,
            queries: Arc::new(Queries::embedded()?),
        })
    }

    /// Wrap an open [`Database`].
    pub fn from_database(db: &Database) -> Result<Self, MnemoError> {
        Self::new(db.connection().clone())
    }

    /// Open (or create) the database at `path` and wrap it.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, MnemoError> {
        let db = Database::open(path).await?;
        Self::from_database(&db)
    }

    /// Save a memory, assigning an id and timestamp when unset.
    ///
    /// Returns the item as stored.
    pub async fn save_memory(&self, mut item: MemoryItem) -> Result<MemoryItem, MnemoError> {
        if item.id.is_empty() {
            item.id = uuid::Uuid::new_v4().to_string();
        }
        if item.created_at.timestamp() == 0 {
            item.created_at = Utc::now();
        }

        let tags = serde_json::to_string(&item.tags)
            .map_err(|e| MnemoError::Internal(format!("failed to encode tags: {e}")))?;
        let embedding = vector_to_bytes(&item.embedding);
        let params = (
            item.id.clone(),
            item.text.clone(),
            tags,
            item.source.to_string(),
            item.confidence,
            item.created_at.timestamp(),
            item.provider.clone(),
            item.model_id.clone(),
            item.dim as i64,
            embedding,
        );

        let queries = Arc::clone(&self.queries);
        self.conn
            .call(move |conn| {
                conn.prepare_cached(&queries.insert_memory)?.execute(params)?;
                Ok(())
            })
            .await
            .map_err(map_tr_err("save memory"))?;

        debug!(id = %item.id, "memory saved");
        Ok(item)
    }

    /// All memories, newest first.
    pub async fn get_all_memories(&self) -> Result<Vec<MemoryItem>, MnemoError> {
        let queries = Arc::clone(&self.queries);
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare_cached(&queries.select_all_memories)?;
                let rows = stmt.query_map([], row_to_memory)?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await
            .map_err(map_tr_err("query memories"))
    }

    /// One memory by id.
    pub async fn get_memory(&self, id: &str) -> Result<Option<MemoryItem>, MnemoError> {
        let id = id.to_string();
        let queries = Arc::clone(&self.queries);
        self.conn
            .call(move |conn| {
                conn.prepare_cached(&queries.select_memory_by_id)?
                    .query_row([id], row_to_memory)
                    .optional()
            })
            .await
            .map_err(map_tr_err("get memory"))
    }

    pub async fn count_memories(&self) -> Result<usize, MnemoError> {
        let queries = Arc::clone(&self.queries);
        let count: i64 = self
            .conn
            .call(move |conn| conn.query_row(&queries.count_memories, [], |row| row.get(0)))
            .await
            .map_err(map_tr_err("count memories"))?;
        Ok(count.max(0) as usize)
    }

    /// Brute-force vector search.
    ///
    /// The query is normalized first; stored embeddings already are, so the
    /// dot product is the cosine similarity. Hits below `min_similarity` are
    /// dropped and at most `top_k` are returned, best first.
    pub async fn search_memories(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        min_similarity: f64,
    ) -> Result<Vec<SearchResult>, MnemoError> {
        let query = normalize(query_embedding);
        let mut results: Vec<SearchResult> = self
            .get_all_memories()
            .await?
            .into_iter()
            .filter_map(|item| {
                let similarity = dot_product(&query, &item.embedding);
                (similarity >= min_similarity).then_some(SearchResult { item, similarity })
            })
            .collect();

        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        results.truncate(top_k);
        Ok(results)
    }

    /// Full-text search over memory text.
    ///
    /// `fts_query` is passed to FTS5 `MATCH` as-is. Snippets mark hits with
    /// `[` `]`. Results are ordered by bm25, best first.
    pub async fn search_memories_fts(
        &self,
        fts_query: &str,
        top_k: usize,
    ) -> Result<Vec<MemoryFtsResult>, MnemoError> {
        if fts_query.trim().is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let fts_query = fts_query.to_string();
        let limit = top_k as i64;
        let queries = Arc::clone(&self.queries);
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare_cached(&queries.search_memories_fts)?;
                let rows = stmt.query_map(rusqlite::params![fts_query, limit], |row| {
                    Ok(MemoryFtsResult {
                        item: row_to_memory(row)?,
                        snippet: row.get(10)?,
                        rank: row.get(11)?,
                    })
                })?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await
            .map_err(map_tr_err("search memories"))
    }

    /// Replace a memory's embedding and model identity. Used by reindexing.
    pub async fn update_memory_embedding(
        &self,
        id: &str,
        embedding: &[f32],
        model_id: &str,
        dim: usize,
        provider: &str,
    ) -> Result<(), MnemoError> {
        let params = (
            vector_to_bytes(embedding),
            model_id.to_string(),
            dim as i64,
            provider.to_string(),
            id.to_string(),
        );
        let queries = Arc::clone(&self.queries);
        self.conn
            .call(move |conn| {
                conn.prepare_cached(&queries.update_memory_embedding)?
                    .execute(params)?;
                Ok(())
            })
            .await
            .map_err(map_tr_err("update memory embedding"))
    }

    /// Delete one memory. Returns whether a row was removed.
    pub async fn delete_memory(&self, id: &str) -> Result<bool, MnemoError> {
        let id = id.to_string();
        let queries = Arc::clone(&self.queries);
        let removed = self
            .conn
            .call(move |conn| conn.execute(&queries.delete_memory, [id]))
            .await
            .map_err(map_tr_err("delete memory"))?;
        Ok(removed > 0)
    }

    pub async fn clear_memories(&self) -> Result<(), MnemoError> {
        let queries = Arc::clone(&self.queries);
        self.conn
            .call(move |conn| conn.execute(&queries.delete_all_memories, []))
            .await
            .map_err(map_tr_err("clear memories"))?;
        Ok(())
    }

    /// Append a history turn, assigning an id and timestamp when unset.
    pub async fn save_history(&self, mut item: HistoryItem) -> Result<HistoryItem, MnemoError> {
        if item.id.is_empty() {
            item.id = uuid::Uuid::new_v4().to_string();
        }
        if item.created_at.timestamp() == 0 {
            item.created_at = Utc::now();
        }
        let params = (
            item.id.clone(),
            item.role.clone(),
            item.content.clone(),
            item.created_at.timestamp(),
            item.session_id.clone(),
        );
        let queries = Arc::clone(&self.queries);
        self.conn
            .call(move |conn| {
                conn.prepare_cached(&queries.insert_history)?.execute(params)?;
                Ok(())
            })
            .await
            .map_err(map_tr_err("save history"))?;
        Ok(item)
    }

    /// Full-text search over history content, best first.
    pub async fn search_history(
        &self,
        fts_query: &str,
        top_k: usize,
    ) -> Result<Vec<HistorySearchResult>, MnemoError> {
        if fts_query.trim().is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        let fts_query = fts_query.to_string();
        let limit = top_k as i64;
        let queries = Arc::clone(&self.queries);
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare_cached(&queries.search_history_fts)?;
                let rows = stmt.query_map(rusqlite::params![fts_query, limit], |row| {
                    Ok(HistorySearchResult {
                        item: row_to_history(row)?,
                        snippet: row.get(5)?,
                        rank: row.get(6)?,
                    })
                })?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await
            .map_err(map_tr_err("search history"))
    }

    /// The `limit` most recent history turns, newest first.
    pub async fn get_recent_history(&self, limit: usize) -> Result<Vec<HistoryItem>, MnemoError> {
        let limit = limit as i64;
        let queries = Arc::clone(&self.queries);
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare_cached(&queries.select_recent_history)?;
                let rows = stmt.query_map([limit], row_to_history)?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await
            .map_err(map_tr_err("query recent history"))
    }

    pub async fn clear_history(&self) -> Result<(), MnemoError> {
        let queries = Arc::clone(&self.queries);
        self.conn
            .call(move |conn| conn.execute(&queries.delete_all_history, []))
            .await
            .map_err(map_tr_err("clear history"))?;
        Ok(())
    }
}

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

/// Map the ten memory columns starting at index 0.
fn row_to_memory(row: &rusqlite::Row<'_>) -> rusqlite::Result<MemoryItem> {
    let tags: String = row.get(2)?;
    let source: String = row.get(3)?;
    let dim: i64 = row.get(8)?;
    let embedding: Vec<u8> = row.get(9)?;

    Ok(MemoryItem {
        id: row.get(0)?,
        text: row.get(1)?,
        // Malformed tag JSON reads as no tags.
        tags: serde_json::from_str(&tags).unwrap_or_default(),
        source: MemorySource::from_stored(&source),
        confidence: row.get(4)?,
        created_at: timestamp(row.get(5)?),
        provider: row.get(6)?,
        model_id: row.get(7)?,
        dim: dim.max(0) as usize,
        embedding: bytes_to_vector(&embedding),
    })
}

fn row_to_history(row: &rusqlite::Row<'_>) -> rusqlite::Result<HistoryItem> {
    Ok(HistoryItem {
        id: row.get(0)?,
        role: row.get(1)?,
        content: row.get(2)?,
        created_at: timestamp(row.get(3)?),
        session_id: row.get(4)?,
    })
}
