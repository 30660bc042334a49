// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider capability traits.
//!
//! The retrieval core only ever talks to these two narrow interfaces; one
//! adapter per vendor lives outside the workspace. Both use `#[async_trait]`
//! for dynamic dispatch compatibility.

pub mod embedding;
pub mod query;

pub use embedding::EmbeddingProvider;
pub use query::{ChatStream, QueryProvider, collect_response};
