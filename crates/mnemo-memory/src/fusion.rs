// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Score fusion of vector and full-text hits.
//!
//! Vector hits carry a cosine similarity in `[0, 1]`; FTS hits carry a bm25
//! rank where more negative is better. The rank is mapped onto `[0, 1]` with
//! a fixed scale so both can be blended.

use std::collections::HashMap;

use crate::types::{MemoryFtsResult, ResultSource, SearchResult, UnifiedResult};

/// bm25 rank at which an FTS-only hit reaches a score of 0.
///
/// Calibrated for short memory texts; a rank of `-FTS_RANK_SCALE` or better
/// still only maps to 1.0.
pub const FTS_RANK_SCALE: f64 = 20.0;

const VECTOR_WEIGHT: f64 = 0.6;
const FTS_WEIGHT: f64 = 0.4;
/// Bonus for items both paths agree on.
const BOTH_BOOST: f64 = 1.2;

/// Map a bm25 rank onto `[0, 1]`.
pub fn fts_rank_score(rank: f64) -> f64 {
    (1.0 + rank / FTS_RANK_SCALE).clamp(0.0, 1.0)
}

/// Score of a fused result given how it was found.
pub fn unified_score(source: ResultSource, vector_score: f64, fts_rank: f64) -> f64 {
    match source {
        ResultSource::Vector => vector_score,
        ResultSource::Fts => fts_rank_score(fts_rank),
        ResultSource::Both => ((vector_score * VECTOR_WEIGHT
            + fts_rank_score(fts_rank) * FTS_WEIGHT)
            * BOTH_BOOST)
            .clamp(0.0, 1.0),
    }
}

/// Merge both result lists into at most `top_k` unified results, best first.
///
/// Ties keep insertion order: vector hits in their order, then FTS-only hits.
pub fn fuse_results(
    vector: Vec<SearchResult>,
    fts: Vec<MemoryFtsResult>,
    top_k: usize,
) -> Vec<UnifiedResult> {
    let mut fused: Vec<UnifiedResult> = Vec::with_capacity(vector.len() + fts.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for hit in vector {
        if index.contains_key(&hit.item.id) {
            continue;
        }
        index.insert(hit.item.id.clone(), fused.len());
        fused.push(UnifiedResult {
            score: 0.0,
            source: ResultSource::Vector,
            vector_score: hit.similarity,
            fts_rank: 0.0,
            snippet: String::new(),
            item: hit.item,
        });
    }

    for hit in fts {
        match index.get(&hit.item.id) {
            Some(&pos) => {
                let existing = &mut fused[pos];
                if existing.source == ResultSource::Vector {
                    existing.source = ResultSource::Both;
                    existing.fts_rank = hit.rank;
                    existing.snippet = hit.snippet;
                }
            }
            None => {
                index.insert(hit.item.id.clone(), fused.len());
                fused.push(UnifiedResult {
                    score: 0.0,
                    source: ResultSource::Fts,
                    vector_score: 0.0,
                    fts_rank: hit.rank,
                    snippet: hit.snippet,
                    item: hit.item,
                });
            }
        }
    }

    for result in &mut fused {
        result.score = unified_score(result.source, result.vector_score, result.fts_rank);
    }

    // sort_by is stable.
    fused.sort_by(|a, b| b.score.total_cmp(&a.score));
    fused.truncate(top_k);
    fused
}
