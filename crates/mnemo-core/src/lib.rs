// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Mnemo memory engine.
//!
//! This crate provides the error type, the two provider capability traits the
//! retrieval core depends on, and the small set of types shared across the
//! workspace. Vendor clients implement the traits defined here; nothing in the
//! workspace depends on a vendor type directly.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{MnemoError, ReindexFailure};
pub use traits::{ChatStream, EmbeddingProvider, QueryProvider, collect_response};
pub use types::Model;
