// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order is `./mnemo.toml` > `<config_dir>/mnemo/mnemo.toml` >
//! `/etc/mnemo/mnemo.toml`, with `MNEMO_*` environment variables on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::MnemoConfig;

/// File name looked up in every configuration directory.
pub const CONFIG_FILE_NAME: &str = "mnemo.toml";

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/mnemo/mnemo.toml";

/// Top-level sections, used to turn `MNEMO_SECTION_KEY` into `section.key`.
const SECTIONS: &[&str] = &["storage", "model", "memory", "reindex"];

/// Model tables nested under `[model]`.
const MODEL_TABLES: &[&str] = &["embedding_model", "tool_model"];

/// Load configuration from every standard location with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/mnemo/mnemo.toml`
/// 3. `<config_dir>/mnemo/mnemo.toml`
/// 4. `./mnemo.toml`
/// 5. `MNEMO_*` environment variables
pub fn load_config() -> Result<MnemoConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only. No files, no environment.
pub fn load_config_from_str(toml_content: &str) -> Result<MnemoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MnemoConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file, with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MnemoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MnemoConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the layered Figment without extracting it.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(MnemoConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(CONFIG_FILE_NAME))
        .merge(env_provider())
}

/// `<config_dir>/mnemo/mnemo.toml`, if the platform has a config dir.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mnemo").join(CONFIG_FILE_NAME))
}

/// Environment provider with explicit section mapping.
///
/// Keys contain underscores, so `Env::split("_")` would be ambiguous:
/// `MNEMO_MEMORY_MIN_SIMILARITY` must become `memory.min_similarity`, and
/// `MNEMO_MODEL_EMBEDDING_MODEL_MODEL_ID` must become
/// `model.embedding_model.model_id`.
fn env_provider() -> Env {
    Env::prefixed("MNEMO_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        else {
            continue;
        };
        if *section == "model" {
            for table in MODEL_TABLES {
                if let Some(field) = rest.strip_prefix(table).and_then(|r| r.strip_prefix('_')) {
                    return format!("model.{table}.{field}");
                }
            }
        }
        return format!("{section}.{rest}");
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("memory_min_similarity"), "memory.min_similarity");
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("reindex_max_retries"), "reindex.max_retries");
    }

    #[test]
    fn env_keys_map_into_model_tables() {
        assert_eq!(
            map_env_key("model_embedding_model_model_id"),
            "model.embedding_model.model_id"
        );
        assert_eq!(
            map_env_key("model_tool_model_provider"),
            "model.tool_model.provider"
        );
    }

    #[test]
    fn unknown_env_keys_pass_through() {
        assert_eq!(map_env_key("verbose"), "verbose");
    }
}
