// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How a memory was created.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemorySource {
    /// The user asked for this to be remembered.
    #[default]
    Explicit,
    /// Pulled out of a conversation automatically.
    Extracted,
}

impl MemorySource {
    /// Parse a stored value. Anything unrecognized reads as `Extracted`.
    pub fn from_stored(s: &str) -> Self {
        s.parse().unwrap_or(MemorySource::Extracted)
    }
}

/// A stored fact or preference with its embedding.
///
/// `created_at` at the Unix epoch (the `Default`) means "not set yet"; the
/// store stamps the current time on save. An empty `id` is replaced with a
/// fresh UUID v4 the same way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    pub id: String,
    pub text: String,
    pub tags: Vec<String>,
    pub source: MemorySource,
    /// 0.0 to 1.0.
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    /// Provider of the embedding model that produced `embedding`.
    pub provider: String,
    pub model_id: String,
    /// Always `embedding.len()`.
    pub dim: usize,
    /// L2-normalized, so a dot product against a normalized query is cosine similarity.
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

impl MemoryItem {
    /// A new explicit memory with full confidence and no embedding yet.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            confidence: 1.0,
            ..Self::default()
        }
    }
}

/// One conversation turn. Append-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: String,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub session_id: Option<String>,
}

impl HistoryItem {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            ..Self::default()
        }
    }
}

/// A vector-search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub item: MemoryItem,
    pub similarity: f64,
}

/// A full-text hit on a memory. Lower `rank` is a better match (bm25).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryFtsResult {
    pub item: MemoryItem,
    pub snippet: String,
    pub rank: f64,
}

/// A full-text hit on a history turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySearchResult {
    pub item: HistoryItem,
    pub snippet: String,
    pub rank: f64,
}

/// Which retrieval path(s) produced a fused result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Vector,
    Fts,
    Both,
}

/// A fused retrieval result with its score in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedResult {
    pub item: MemoryItem,
    pub score: f64,
    pub source: ResultSource,
    /// Cosine similarity; 0 when the vector path did not find this item.
    pub vector_score: f64,
    /// bm25 rank; 0 when the FTS path did not find this item.
    pub fts_rank: f64,
    pub snippet: String,
}

/// The output of one retrieval call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResponse {
    pub results: Vec<UnifiedResult>,
    pub query: String,
}
