// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rendering retrieval results as text.

use std::fmt::Write;

use crate::types::RetrievalResponse;

/// Human-readable listing of a retrieval response.
///
/// ```text
/// Found 2 memories:
///
/// 1. [0.92] User prefers dark mode
///    Tags: ui, preferences
///    Source: both
/// 2. [0.81] User works on a Rust project
///    Source: vector
/// ```
pub fn format_as_text(response: &RetrievalResponse) -> String {
    if response.results.is_empty() {
        return "No memories found.".to_string();
    }

    let mut out = format!("Found {} memories:\n\n", response.results.len());
    for (i, result) in response.results.iter().enumerate() {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{}. [{:.2}] {}", i + 1, result.score, result.item.text);
        if !result.item.tags.is_empty() {
            let _ = writeln!(out, "   Tags: {}", result.item.tags.join(", "));
        }
        let _ = writeln!(out, "   Source: {}", result.source);
    }
    out
}

/// A "## Relevant Memories" bullet block for prompt injection.
///
/// Whole bullets are added in result order until the next one would exceed
/// `max_chars` characters (not bytes). Returns `None` when there is nothing
/// to inject.
pub fn format_for_prompt(response: &RetrievalResponse, max_chars: usize) -> Option<String> {
    const HEADER: &str = "## Relevant Memories\n";

    let mut out = String::from(HEADER);
    let mut used = HEADER.chars().count();
    for result in &response.results {
        let line = format!("- {}\n", result.item.text);
        let len = line.chars().count();
        if used + len > max_chars {
            break;
        }
        out.push_str(&line);
        used += len;
    }
    (out.len() > HEADER.len()).then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MemoryItem, ResultSource, UnifiedResult};

    fn result(text: &str, score: f64, tags: &[&str], source: ResultSource) -> UnifiedResult {
        UnifiedResult {
            item: MemoryItem {
                tags: tags.iter().map(|t| t.to_string()).collect(),
                ..MemoryItem::new(text)
            },
            score,
            source,
            vector_score: 0.0,
            fts_rank: 0.0,
            snippet: String::new(),
        }
    }

    fn response(results: Vec<UnifiedResult>) -> RetrievalResponse {
        RetrievalResponse {
            results,
            query: "q".into(),
        }
    }

    #[test]
    fn empty_response() {
        assert_eq!(format_as_text(&RetrievalResponse::default()), "No memories found.");
    }

    #[test]
    fn lists_results_with_tags_and_source() {
        let text = format_as_text(&response(vec![
            result("User prefers dark mode", 0.916, &["ui", "preferences"], ResultSource::Both),
            result("User works on a Rust project", 0.8, &[], ResultSource::Vector),
        ]));
        assert_eq!(
            text,
            "Found 2 memories:\n\n\
             1. [0.92] User prefers dark mode\n   Tags: ui, preferences\n   Source: both\n\
             2. [0.80] User works on a Rust project\n   Source: vector\n"
        );
    }

    #[test]
    fn prompt_block_respects_budget() {
        let resp = response(vec![
            result("short fact", 0.9, &[], ResultSource::Vector),
            result("a much longer fact that will not fit", 0.8, &[], ResultSource::Fts),
        ]);
        let block = format_for_prompt(&resp, 40).unwrap();
        assert_eq!(block, "## Relevant Memories\n- short fact\n");

        let all = format_for_prompt(&resp, 4000).unwrap();
        assert!(all.ends_with("- a much longer fact that will not fit\n"));
    }

    #[test]
    fn prompt_budget_counts_characters() {
        // 32 characters, 36 bytes.
        let resp = response(vec![result("café ☕ é", 0.9, &[], ResultSource::Vector)]);
        let block = format_for_prompt(&resp, 32).unwrap();
        assert_eq!(block, "## Relevant Memories\n- café ☕ é\n");
        assert!(block.len() > 32);
        assert!(format_for_prompt(&resp, 31).is_none());
    }

    #[test]
    fn prompt_block_empty_when_nothing_fits() {
        let resp = response(vec![result("fact", 0.9, &[], ResultSource::Vector)]);
        assert!(format_for_prompt(&resp, 10).is_none());
        assert!(format_for_prompt(&RetrievalResponse::default(), 4000).is_none());
    }
}
