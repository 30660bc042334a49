// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-term memory engine: storage, hybrid retrieval, and reindexing.
//!
//! ## Architecture
//!
//! - **MemoryStore**: SQLite persistence with BLOB vectors and FTS5
//! - **Retriever**: LLM query transformation, parallel vector and FTS
//!   search, score fusion
//! - **Reindexer**: retrying pipeline that re-embeds every memory with a new model
//! - **MemoryWriter**: embeds and saves explicit memories
//! - **format**: text rendering of retrieval results
//!
//! Embedding and chat vendors plug in through the
//! [`EmbeddingProvider`](mnemo_core::EmbeddingProvider) and
//! [`QueryProvider`](mnemo_core::QueryProvider) traits.

pub mod format;
pub mod fts;
pub mod fusion;
pub mod queries;
pub mod reindex;
pub mod retriever;
pub mod store;
pub mod transform;
pub mod types;
pub mod vector;
pub mod writer;

pub use format::{format_as_text, format_for_prompt};
pub use fusion::fuse_results;
pub use reindex::{ReindexJob, Reindexer, reindex_memories};
pub use retriever::Retriever;
pub use store::MemoryStore;
pub use types::*;
pub use writer::{MemoryWriter, parse_tags};

pub use mnemo_config::{FtsStrategy, MemoryConfig};
