// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompts and response parsing for LLM-assisted query rewriting.

/// Prompt asking for a hypothetical answer and a search-friendly rephrasing.
pub fn transform_prompt(query: &str) -> String {
    format!(
        "Given this user query, provide two transformations for memory retrieval:\n\
         1. A brief 1-2 sentence answer to the query (as if you know the answer)\n\
         2. A rephrased version optimized for semantic search\n\
         \n\
         User query: {query}\n\
         \n\
         Respond in this exact format (no other text):\n\
         ANSWER: <brief answer>\n\
         REPHRASE: <rephrased query>"
    )
}

/// Prompt asking for a one-sentence summary suitable for keyword search.
pub fn summary_prompt(query: &str) -> String {
    format!(
        "Summarize this query in one short sentence for text search:\n\
         Query: {query}\n\
         \n\
         Respond with ONLY the summary, no other text."
    )
}

/// Prompt asking for a handful of comma-separated search terms.
pub fn keywords_prompt(query: &str) -> String {
    format!(
        "Extract 3-5 key search terms from this query:\n\
         Query: {query}\n\
         \n\
         Respond with ONLY comma-separated keywords, no other text."
    )
}

const ANSWER_TAG: &str = "ANSWER:";
const REPHRASE_TAG: &str = "REPHRASE:";

/// Turn a transform response into search candidates.
///
/// The original query always comes first. `ANSWER:` and `REPHRASE:` lines
/// contribute their non-empty values in response order; any other line is
/// ignored.
pub fn parse_transform_response(response: &str, original: &str) -> Vec<String> {
    let mut candidates = vec![original.to_string()];
    for line in response.lines().map(str::trim) {
        let value = line
            .strip_prefix(ANSWER_TAG)
            .or_else(|| line.strip_prefix(REPHRASE_TAG))
            .map(str::trim);
        if let Some(value) = value
            && !value.is_empty()
        {
            candidates.push(value.to_string());
        }
    }
    candidates
}

/// Split a keywords response on commas, dropping quotes and empty entries.
pub fn parse_keywords(response: &str) -> Vec<String> {
    response
        .split(',')
        .map(|kw| kw.replace('"', "").trim().to_string())
        .filter(|kw| !kw.is_empty())
        .collect()
}
