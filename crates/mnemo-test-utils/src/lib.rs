// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Mnemo.
//!
//! Deterministic stand-ins for the remote embedding and chat providers, so
//! retrieval and reindex tests run without network access.
//!
//! # Components
//!
//! - [`KeywordEmbedder`] - two-dimensional embedder keyed on topic words
//! - [`FailingEmbedder`] - embedder that fails on demand and records attempt times
//! - [`FlakyEmbedder`] - embedder that fails a fixed number of times per text
//! - [`MockQueryProvider`] - chat provider with pre-configured responses

pub mod mock_embedder;
pub mod mock_query;
pub mod logging;

pub use mock_embedder::{FailingEmbedder, FlakyEmbedder, KeywordEmbedder};
pub use mock_query::MockQueryProvider;
pub use logging::init_test_tracing;
