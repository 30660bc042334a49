// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Mnemo workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a model at a specific provider (e.g. `openai` / `text-embedding-3-small`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Model {
    /// Provider name, e.g. "openai", "google", "anthropic".
    pub provider: String,
    /// Provider-specific model identifier.
    pub model_id: String,
}

impl Model {
    /// Creates a new model identifier.
    pub fn new(provider: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model_id: model_id.into(),
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.provider, self.model_id)
    }
}
