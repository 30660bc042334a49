// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use mnemo_core::Model;

use crate::diagnostic::ConfigError;
use crate::model::MnemoConfig;

/// Validate a deserialized configuration.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &MnemoConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(invalid("storage.database_path must not be empty".to_string()));
    }

    check_model("model.embedding_model", &config.model.embedding_model, &mut errors);
    if let Some(tool_model) = &config.model.tool_model {
        check_model("model.tool_model", tool_model, &mut errors);
    }

    let min_similarity = config.memory.min_similarity;
    if !(-1.0..=1.0).contains(&min_similarity) {
        errors.push(invalid(format!(
            "memory.min_similarity must be between -1.0 and 1.0, got {min_similarity}"
        )));
    }

    if config.memory.memory_top_k == 0 {
        errors.push(invalid("memory.memory_top_k must be greater than 0".to_string()));
    }

    if config.memory.history_top_k == 0 {
        errors.push(invalid("memory.history_top_k must be greater than 0".to_string()));
    }

    if config.reindex.queue_capacity == 0 {
        errors.push(invalid("reindex.queue_capacity must be greater than 0".to_string()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_model(name: &str, model: &Model, errors: &mut Vec<ConfigError>) {
    if model.provider.trim().is_empty() {
        errors.push(invalid(format!("{name}.provider must not be empty")));
    }
    if model.model_id.trim().is_empty() {
        errors.push(invalid(format!("{name}.model_id must not be empty")));
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::Validation { message }
}
