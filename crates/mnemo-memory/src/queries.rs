// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named SQL statements, parsed from the embedded `queries.sql`.

use std::collections::HashMap;

use mnemo_core::MnemoError;
use regex::Regex;

const QUERIES_SQL: &str = include_str!("queries.sql");

/// Every statement the store runs, looked up once at construction.
#[derive(Debug, Clone)]
pub struct Queries {
    pub insert_memory: String,
    pub select_all_memories: String,
    pub select_memory_by_id: String,
    pub count_memories: String,
    pub update_memory_embedding: String,
    pub delete_memory: String,
    pub delete_all_memories: String,
    pub search_memories_fts: String,
    pub insert_history: String,
    pub search_history_fts: String,
    pub select_recent_history: String,
    pub delete_all_history: String,
}

impl Queries {
    /// Parse the statements compiled into the crate.
    pub fn embedded() -> Result<Self, MnemoError> {
        Self::parse(QUERIES_SQL)
    }

    /// Parse a `-- name:` annotated SQL file.
    ///
    /// Fails with an internal error if any statement the store needs is missing.
    pub fn parse(content: &str) -> Result<Self, MnemoError> {
        let mut named = parse_named_queries(content)?;
        let mut take = |name: &str| {
            named
                .remove(name)
                .ok_or_else(|| MnemoError::Internal(format!("missing named query `{name}`")))
        };

        Ok(Self {
            insert_memory: take("InsertMemory")?,
            select_all_memories: take("SelectAllMemories")?,
            select_memory_by_id: take("SelectMemoryById")?,
            count_memories: take("CountMemories")?,
            update_memory_embedding: take("UpdateMemoryEmbedding")?,
            delete_memory: take("DeleteMemory")?,
            delete_all_memories: take("DeleteAllMemories")?,
            search_memories_fts: take("SearchMemoriesFts")?,
            insert_history: take("InsertHistory")?,
            search_history_fts: take("SearchHistoryFts")?,
            select_recent_history: take("SelectRecentHistory")?,
            delete_all_history: take("DeleteAllHistory")?,
        })
    }
}

/// Split a SQL file on `-- name: X` marker lines.
///
/// Each statement runs from its marker to the next marker (or end of file),
/// trimmed, with one trailing `;` removed.
pub fn parse_named_queries(content: &str) -> Result<HashMap<String, String>, MnemoError> {
    let marker = Regex::new(r"(?m)^--\s*name:\s*(\w+)\s*$")
        .map_err(|e| MnemoError::Internal(format!("invalid query marker pattern: {e}")))?;

    let found: Vec<(String, usize, usize)> = marker
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?;
            Some((name.as_str().to_string(), whole.start(), whole.end()))
        })
        .collect();

    let mut queries = HashMap::with_capacity(found.len());
    for (i, (name, _, body_start)) in found.iter().enumerate() {
        let body_end = found.get(i + 1).map_or(content.len(), |next| next.1);
        let body = content[*body_start..body_end].trim();
        let body = body.strip_suffix(';').unwrap_or(body).trim_end();
        queries.insert(name.clone(), body.to_string());
    }
    Ok(queries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_queries_parse() {
        let queries = Queries::embedded().unwrap();
        assert!(queries.insert_memory.starts_with("INSERT INTO memories"));
        assert!(queries.search_memories_fts.contains("bm25(memories_fts)"));
        assert!(!queries.delete_all_history.ends_with(';'));
    }

    #[test]
    fn statements_end_at_next_marker() {
        let sql = "-- name: A\nSELECT 1;\n\n-- name: B\nSELECT 2\nFROM t;\n";
        let named = parse_named_queries(sql).unwrap();
        assert_eq!(named["A"], "SELECT 1");
        assert_eq!(named["B"], "SELECT 2\nFROM t");
    }

    #[test]
    fn text_before_first_marker_is_ignored() {
        let sql = "-- header comment\n-- name: Only\nDELETE FROM t;";
        let named = parse_named_queries(sql).unwrap();
        assert_eq!(named.len(), 1);
        assert_eq!(named["Only"], "DELETE FROM t");
    }

    #[test]
    fn missing_query_is_an_internal_error() {
        let err = Queries::parse("-- name: InsertMemory\nINSERT 1;").unwrap_err();
        assert!(matches!(err, MnemoError::Internal(msg) if msg.contains("SelectAllMemories")));
    }
}
