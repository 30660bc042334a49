// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Mnemo memory engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at load time instead of silently falling back to a default.

use mnemo_core::Model;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Top-level Mnemo configuration.
///
/// Every section is optional and defaults to the values documented on its fields.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MnemoConfig {
    /// Database location and journal settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Embedding and tool model selection.
    #[serde(default)]
    pub model: ModelConfig,

    /// Retrieval tuning.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Re-embedding pipeline tuning.
    #[serde(default)]
    pub reindex: ReindexConfig,
}

/// SQLite storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journaling.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("mnemo").join("memory.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("memory.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Model selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    /// Model used to embed memories and queries. Changing it requires a reindex.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: Model,

    /// Chat model used for query transformation and FTS rewriting.
    /// `None` disables every LLM-assisted step.
    #[serde(default = "default_tool_model")]
    pub tool_model: Option<Model>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            embedding_model: default_embedding_model(),
            tool_model: default_tool_model(),
        }
    }
}

fn default_embedding_model() -> Model {
    Model::new("openai", "text-embedding-3-small")
}

fn default_tool_model() -> Option<Model> {
    Some(Model::new("openai", "gpt-4o-mini"))
}

/// How the FTS query is derived from the user's raw query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(from = "String", into = "String")]
pub enum FtsStrategy {
    /// Tokenize the raw query and OR the tokens together.
    #[default]
    Direct,
    /// Ask the tool model for a one-sentence summary and tokenize that.
    Summary,
    /// Ask the tool model for a handful of search keywords.
    Keywords,
    /// Direct first, widened with a summary search when results are sparse.
    Auto,
}

impl From<String> for FtsStrategy {
    /// Unknown or empty values fall back to [`FtsStrategy::Direct`].
    fn from(value: String) -> Self {
        value.trim().parse().unwrap_or_default()
    }
}

impl From<FtsStrategy> for String {
    fn from(value: FtsStrategy) -> Self {
        value.to_string()
    }
}

/// Retrieval configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Minimum cosine similarity for a vector hit to be kept.
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,

    /// Maximum number of memories returned by one retrieval.
    #[serde(default = "default_memory_top_k")]
    pub memory_top_k: usize,

    /// Maximum number of history turns returned by one history search.
    #[serde(default = "default_history_top_k")]
    pub history_top_k: usize,

    /// Character budget for the memory block injected into a prompt.
    #[serde(default = "default_max_injected_chars")]
    pub max_injected_chars: usize,

    /// FTS query strategy.
    #[serde(default)]
    pub fts_strategy: FtsStrategy,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            min_similarity: default_min_similarity(),
            memory_top_k: default_memory_top_k(),
            history_top_k: default_history_top_k(),
            max_injected_chars: default_max_injected_chars(),
            fts_strategy: FtsStrategy::default(),
        }
    }
}

fn default_min_similarity() -> f64 {
    0.80
}

fn default_memory_top_k() -> usize {
    10
}

fn default_history_top_k() -> usize {
    10
}

fn default_max_injected_chars() -> usize {
    4000
}

/// Reindex pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ReindexConfig {
    /// Retries per memory after the first failed attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff unit in seconds; retry `n` waits `n * backoff_secs`.
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,

    /// Capacity of each bounded stage queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for ReindexConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_secs: default_backoff_secs(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_max_retries() -> u32 {
    5
}

fn default_backoff_secs() -> u64 {
    2
}

fn default_queue_capacity() -> usize {
    64
}
