// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! FTS5 query construction.
//!
//! User text is never passed to `MATCH` raw: FTS5 operator characters are
//! stripped and the remaining words are OR-ed so any single term can hit.

use std::collections::HashSet;

use crate::types::MemoryFtsResult;

/// Characters removed outright, joining the text around them.
const FTS_STRIPPED_CHARS: &[char] = &['"', '\'', '*', '+', '^', ':', '(', ')'];

/// Upper-case barewords FTS5 parses as operators.
const FTS_KEYWORDS: &[&str] = &["AND", "OR", "NOT", "NEAR"];

/// Remove FTS5 syntax from `text`.
///
/// Hyphens and any other ASCII punctuation except `_` become word
/// separators, since FTS5 barewords cannot contain them.
fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !FTS_STRIPPED_CHARS.contains(c))
        .map(|c| {
            if c.is_ascii_punctuation() && c != '_' {
                ' '
            } else {
                c
            }
        })
        .collect()
}

fn bareword(token: &str) -> String {
    if FTS_KEYWORDS.contains(&token) {
        token.to_lowercase()
    } else {
        token.to_string()
    }
}

/// Build an OR query from free text.
///
/// Special characters are removed, hyphens split words, and single-character
/// tokens are dropped. Returns an empty string when nothing is left.
pub fn tokenize_for_fts(text: &str) -> String {
    sanitize(text)
        .split_whitespace()
        .filter(|token| token.len() > 1)
        .map(bareword)
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Join already-extracted keywords into an OR query.
///
/// A multi-word keyword stays together as an implicit AND of its words.
pub fn keywords_query(keywords: &[String]) -> String {
    keywords
        .iter()
        .map(|kw| {
            sanitize(kw)
                .split_whitespace()
                .map(bareword)
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|term| !term.is_empty())
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Minimum hit count below which the `auto` strategy widens the search.
pub fn auto_threshold(top_k: usize) -> usize {
    (top_k / 2).max(3)
}

/// Append `extra` hits whose ids are not already in `primary`.
pub fn merge_fts_results(
    mut primary: Vec<MemoryFtsResult>,
    extra: Vec<MemoryFtsResult>,
) -> Vec<MemoryFtsResult> {
    let mut seen: HashSet<String> = primary.iter().map(|r| r.item.id.clone()).collect();
    for result in extra {
        if seen.insert(result.item.id.clone()) {
            primary.push(result);
        }
    }
    primary
}
