// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Mnemo memory engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The primary error type used across the store, retriever, and reindex pipeline.
#[derive(Debug, Error)]
pub enum MnemoError {
    /// Configuration errors (missing model, invalid values). Never retried.
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage errors (open, query, exec), wrapped with the failing operation.
    #[error("storage error: failed to {context}: {source}")]
    Storage {
        context: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Remote embedding or chat provider errors.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Caller-supplied input was rejected before reaching storage.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Both retrieval paths failed, so no result could be produced.
    #[error("retrieval failed: vector: {vector}, fts: {fts}")]
    Retrieval {
        vector: Box<MnemoError>,
        fts: Box<MnemoError>,
    },

    /// One or more memories could not be re-embedded after all retries.
    #[error("{}", describe_reindex_failures(.failures))]
    Reindex { failures: Vec<ReindexFailure> },

    /// The operation was cancelled by its caller.
    #[error("operation cancelled")]
    Cancelled,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl MnemoError {
    /// Wrap a storage-layer error with the operation that produced it.
    pub fn storage<E>(context: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        MnemoError::Storage {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Build a provider error without an underlying source.
    pub fn provider(message: impl Into<String>) -> Self {
        MnemoError::Provider {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error came from cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, MnemoError::Cancelled)
    }
}

/// A memory that exhausted its reindex retries, with the last error seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexFailure {
    /// Id of the memory that kept its old embedding.
    pub id: String,
    /// Rendered last error for this memory.
    pub error: String,
}

impl fmt::Display for ReindexFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "- ID {}: {}", self.id, self.error)
    }
}

fn describe_reindex_failures(failures: &[ReindexFailure]) -> String {
    let lines: Vec<String> = failures.iter().map(ToString::to_string).collect();
    format!(
        "{} memories failed to reindex:\n{}\nPlease try reindexing again later.",
        failures.len(),
        lines.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_names_operation() {
        let err = MnemoError::storage("save memory", std::io::Error::other("disk full"));
        assert_eq!(
            err.to_string(),
            "storage error: failed to save memory: disk full"
        );
    }

    #[test]
    fn reindex_error_lists_every_failed_id() {
        let err = MnemoError::Reindex {
            failures: vec![
                ReindexFailure {
                    id: "a".into(),
                    error: "rate limited".into(),
                },
                ReindexFailure {
                    id: "b".into(),
                    error: "timeout".into(),
                },
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("2 memories failed to reindex:\n"));
        assert!(msg.contains("- ID a: rate limited"));
        assert!(msg.contains("- ID b: timeout"));
        assert!(msg.ends_with("Please try reindexing again later."));
    }

    #[test]
    fn retrieval_error_mentions_both_paths() {
        let err = MnemoError::Retrieval {
            vector: Box::new(MnemoError::provider("embedding down")),
            fts: Box::new(MnemoError::Internal("fts broken".into())),
        };
        let msg = err.to_string();
        assert!(msg.contains("embedding down"));
        assert!(msg.contains("fts broken"));
    }

    #[test]
    fn cancelled_is_detectable() {
        assert!(MnemoError::Cancelled.is_cancelled());
        assert!(!MnemoError::Internal("x".into()).is_cancelled());
    }
}
