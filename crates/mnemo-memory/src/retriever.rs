// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hybrid retriever combining vector similarity and FTS5 keyword search.
//!
//! Both paths run concurrently. The vector path optionally widens the query
//! with LLM-generated candidates (a hypothetical answer and a rephrasing);
//! the FTS path derives its `MATCH` query according to the configured
//! [`FtsStrategy`]. Results are fused with [`fuse_results`].

use std::collections::HashSet;
use std::sync::Arc;

use mnemo_config::{FtsStrategy, MemoryConfig};
use mnemo_core::{EmbeddingProvider, MnemoError, Model, QueryProvider, collect_response};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::fts::{auto_threshold, keywords_query, merge_fts_results, tokenize_for_fts};
use crate::fusion::fuse_results;
use crate::store::MemoryStore;
use crate::transform::{
    keywords_prompt, parse_keywords, parse_transform_response, summary_prompt, transform_prompt,
};
use crate::types::{HistorySearchResult, MemoryFtsResult, RetrievalResponse, SearchResult};

/// Retrieves memories relevant to a free-text query.
///
/// Holds only immutable configuration and shared handles, so one instance can
/// serve concurrent callers.
pub struct Retriever {
    store: Arc<MemoryStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    embedding_model: Model,
    query: Option<(Arc<dyn QueryProvider>, Model)>,
    config: MemoryConfig,
}

impl Retriever {
    pub fn new(
        store: Arc<MemoryStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        embedding_model: Model,
        config: MemoryConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            embedding_model,
            query: None,
            config,
        }
    }

    /// Enable LLM query transformation with `tool_model`.
    ///
    /// Without a query provider the vector path searches the raw query only
    /// and the `summary`/`keywords` strategies behave like `direct`.
    pub fn with_query_provider(mut self, provider: Arc<dyn QueryProvider>, tool_model: Model) -> Self {
        self.query = Some((provider, tool_model));
        self
    }

    /// Retrieve up to `memory_top_k` fused results for `query`.
    ///
    /// Fails only if both search paths fail, or if `cancel` fires first.
    pub async fn retrieve(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<RetrievalResponse, MnemoError> {
        let (vector, fts) = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(MnemoError::Cancelled),
            pair = async { tokio::join!(self.vector_search(query), self.fts_search(query)) } => pair,
        };

        let (vector, fts) = match (vector, fts) {
            (Ok(vector), Ok(fts)) => (vector, fts),
            (Ok(vector), Err(e)) => {
                warn!(error = %e, "fts search failed, using vector results only");
                (vector, Vec::new())
            }
            (Err(e), Ok(fts)) => {
                warn!(error = %e, "vector search failed, using fts results only");
                (Vec::new(), fts)
            }
            (Err(vector), Err(fts)) => {
                return Err(MnemoError::Retrieval {
                    vector: Box::new(vector),
                    fts: Box::new(fts),
                });
            }
        };

        let vector_hits = vector.len();
        let fts_hits = fts.len();
        let results = fuse_results(vector, fts, self.config.memory_top_k);
        debug!(vector_hits, fts_hits, results = results.len(), "retrieval complete");

        Ok(RetrievalResponse {
            results,
            query: query.to_string(),
        })
    }

    /// Full-text search over conversation history using the direct tokenizer.
    pub async fn retrieve_history(&self, query: &str) -> Result<Vec<HistorySearchResult>, MnemoError> {
        let fts_query = tokenize_for_fts(query);
        if fts_query.is_empty() {
            return Ok(Vec::new());
        }
        self.store
            .search_history(&fts_query, self.config.history_top_k)
            .await
    }

    /// Embed every query candidate and merge the hits.
    ///
    /// A candidate whose embedding or search fails is skipped. The path only
    /// fails when no candidate succeeded.
    async fn vector_search(&self, query: &str) -> Result<Vec<SearchResult>, MnemoError> {
        let candidates = self.query_candidates(query).await;

        let mut seen = HashSet::new();
        let mut merged = Vec::new();
        let mut last_error = None;
        let mut any_succeeded = false;

        for candidate in &candidates {
            match self.search_candidate(candidate).await {
                Ok(hits) => {
                    any_succeeded = true;
                    merged.extend(hits.into_iter().filter(|hit| seen.insert(hit.item.id.clone())));
                }
                Err(e) => {
                    debug!(candidate = %candidate, error = %e, "skipping query candidate");
                    last_error = Some(e);
                }
            }
        }

        if !any_succeeded && let Some(e) = last_error {
            return Err(e);
        }

        merged.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        merged.truncate(self.config.memory_top_k);
        Ok(merged)
    }

    async fn search_candidate(&self, candidate: &str) -> Result<Vec<SearchResult>, MnemoError> {
        let embedding = self.embedder.embed(&self.embedding_model, candidate).await?;
        self.store
            .search_memories(&embedding, self.config.memory_top_k, self.config.min_similarity)
            .await
    }

    /// The original query followed by any LLM-generated variants.
    async fn query_candidates(&self, query: &str) -> Vec<String> {
        match self.ask(&transform_prompt(query)).await {
            Some(response) => parse_transform_response(&response, query),
            None => vec![query.to_string()],
        }
    }

    async fn fts_search(&self, query: &str) -> Result<Vec<MemoryFtsResult>, MnemoError> {
        match self.config.fts_strategy {
            FtsStrategy::Direct => self.fts_direct(query).await,
            FtsStrategy::Summary => self.fts_summary(query).await,
            FtsStrategy::Keywords => self.fts_keywords(query).await,
            FtsStrategy::Auto => self.fts_auto(query).await,
        }
    }

    async fn fts_direct(&self, query: &str) -> Result<Vec<MemoryFtsResult>, MnemoError> {
        self.fts_match(&tokenize_for_fts(query)).await
    }

    async fn fts_summary(&self, query: &str) -> Result<Vec<MemoryFtsResult>, MnemoError> {
        match self.ask(&summary_prompt(query)).await {
            Some(summary) => self.fts_match(&tokenize_for_fts(&summary)).await,
            None => self.fts_direct(query).await,
        }
    }

    async fn fts_keywords(&self, query: &str) -> Result<Vec<MemoryFtsResult>, MnemoError> {
        let fts_query = match self.ask(&keywords_prompt(query)).await {
            Some(response) => keywords_query(&parse_keywords(&response)),
            None => String::new(),
        };
        // Keywords made only of FTS punctuation sanitise to nothing.
        if fts_query.is_empty() {
            return self.fts_direct(query).await;
        }
        self.fts_match(&fts_query).await
    }

    /// Direct search, widened with a summary search when hits are sparse.
    async fn fts_auto(&self, query: &str) -> Result<Vec<MemoryFtsResult>, MnemoError> {
        let direct = self.fts_direct(query).await?;
        let threshold = auto_threshold(self.config.memory_top_k);
        if direct.len() >= threshold {
            return Ok(direct);
        }

        debug!(hits = direct.len(), threshold, "sparse direct fts results, adding summary search");
        match self.fts_summary(query).await {
            Ok(summary) => Ok(merge_fts_results(direct, summary)),
            Err(e) => {
                debug!(error = %e, "summary fts search failed, keeping direct results");
                Ok(direct)
            }
        }
    }

    async fn fts_match(&self, fts_query: &str) -> Result<Vec<MemoryFtsResult>, MnemoError> {
        if fts_query.is_empty() {
            return Ok(Vec::new());
        }
        self.store
            .search_memories_fts(fts_query, self.config.memory_top_k)
            .await
    }

    /// Send one prompt to the tool model.
    ///
    /// Returns `None` when no provider is configured, the call fails, or the
    /// response is blank; callers fall back to the raw query.
    async fn ask(&self, prompt: &str) -> Option<String> {
        let (provider, model) = self.query.as_ref()?;
        let response = match provider.chat_stream(model, prompt).await {
            Ok(stream) => collect_response(stream).await,
            Err(e) => Err(e),
        };
        match response {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => {
                debug!(model = %model, "tool model returned an empty response");
                None
            }
            Err(e) => {
                debug!(model = %model, error = %e, "tool model call failed, falling back");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MemoryItem, ResultSource};
    use crate::vector::normalize;
    use mnemo_storage::Database;
    use mnemo_test_utils::{FailingEmbedder, KeywordEmbedder, MockQueryProvider};
    use tracing_test::traced_test;

    async fn store_with(texts: &[&str]) -> Arc<MemoryStore> {
        let db = Database::open_in_memory().await.unwrap();
        let store = MemoryStore::from_database(&db).unwrap();
        let embedder = KeywordEmbedder::new();
        let model = Model::new("test", "keyword");
        for text in texts {
            let embedding = normalize(&embedder.embed(&model, text).await.unwrap());
            store
                .save_memory(MemoryItem {
                    dim: embedding.len(),
                    embedding,
                    provider: model.provider.clone(),
                    model_id: model.model_id.clone(),
                    ..MemoryItem::new(*text)
                })
                .await
                .unwrap();
        }
        Arc::new(store)
    }

    fn config(strategy: FtsStrategy) -> MemoryConfig {
        MemoryConfig {
            fts_strategy: strategy,
            ..MemoryConfig::default()
        }
    }

    fn retriever(store: Arc<MemoryStore>, embedder: Arc<dyn EmbeddingProvider>, strategy: FtsStrategy) -> Retriever {
        Retriever::new(store, embedder, Model::new("test", "keyword"), config(strategy))
    }

    #[tokio::test]
    async fn direct_strategy_without_provider() {
        let store = store_with(&["User loves hiking in the Alps", "C++ virtual dispatch"]).await;
        let r = retriever(store, Arc::new(KeywordEmbedder::new()), FtsStrategy::Direct);

        let response = r.retrieve("hiking trips", &CancellationToken::new()).await.unwrap();
        assert_eq!(response.query, "hiking trips");
        let hiking = response
            .results
            .iter()
            .find(|res| res.item.text.contains("hiking"))
            .unwrap();
        assert_eq!(hiking.source, ResultSource::Both);
        assert!(hiking.snippet.contains("[hiking]"));
    }

    #[tokio::test]
    async fn transform_candidates_are_embedded() {
        let store = store_with(&["Prefers tabs over spaces"]).await;
        let embedder = Arc::new(KeywordEmbedder::new());
        let provider = Arc::new(MockQueryProvider::always(
            "ANSWER: you prefer tabs\nREPHRASE: indentation preference",
        ));
        let r = retriever(store, embedder.clone(), FtsStrategy::Direct)
            .with_query_provider(provider.clone(), Model::new("test", "tool"));

        r.retrieve("tabs or spaces?", &CancellationToken::new()).await.unwrap();
        assert_eq!(embedder.calls(), 3);
        let prompts = provider.prompts().await;
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("User query: tabs or spaces?"));
    }

    #[tokio::test]
    async fn failed_transform_falls_back_to_original_query() {
        let store = store_with(&["note"]).await;
        let embedder = Arc::new(KeywordEmbedder::new());
        let r = retriever(store, embedder.clone(), FtsStrategy::Direct)
            .with_query_provider(Arc::new(MockQueryProvider::failing()), Model::new("test", "tool"));

        r.retrieve("note", &CancellationToken::new()).await.unwrap();
        assert_eq!(embedder.calls(), 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn vector_failure_keeps_fts_results() {
        let store = store_with(&["Weekly standup is on Monday"]).await;
        let r = retriever(store, Arc::new(FailingEmbedder::new()), FtsStrategy::Direct);

        let response = r.retrieve("standup", &CancellationToken::new()).await.unwrap();
        assert_eq!(response.results.len(), 1);
        assert_eq!(response.results[0].source, ResultSource::Fts);
        assert!(logs_contain("vector search failed"));
    }

    #[tokio::test]
    async fn keywords_strategy_uses_extracted_terms() {
        let store = store_with(&["Dentist appointment on Tuesday", "Grocery list: apples"]).await;
        // Both the transform and the keyword prompt get this reply; the
        // transform parser ignores it.
        let provider = Arc::new(MockQueryProvider::always("\"dentist\", appointment"));
        let r = retriever(store, Arc::new(FailingEmbedder::new()), FtsStrategy::Keywords)
            .with_query_provider(provider, Model::new("test", "tool"));

        let response = r
            .retrieve("when do I see the tooth doctor", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(response.results.len(), 1);
        assert!(response.results[0].item.text.starts_with("Dentist"));
    }

    #[tokio::test]
    async fn keywords_strategy_falls_back_to_direct_on_failure() {
        let store = store_with(&["Dentist appointment Tuesday"]).await;
        let r = retriever(store, Arc::new(FailingEmbedder::new()), FtsStrategy::Keywords)
            .with_query_provider(Arc::new(MockQueryProvider::failing()), Model::new("test", "tool"));

        let response = r.retrieve("dentist", &CancellationToken::new()).await.unwrap();
        assert_eq!(response.results.len(), 1);
    }

    #[tokio::test]
    async fn keywords_strategy_falls_back_to_direct_on_blank_reply() {
        let store = store_with(&["Dentist appointment Tuesday"]).await;
        let provider = Arc::new(MockQueryProvider::new());
        let r = retriever(store, Arc::new(FailingEmbedder::new()), FtsStrategy::Keywords)
            .with_query_provider(provider.clone(), Model::new("test", "tool"));

        let response = r.retrieve("dentist", &CancellationToken::new()).await.unwrap();
        assert_eq!(response.results.len(), 1);
        assert!(provider.prompts().await.iter().any(|p| p.starts_with("Extract 3-5 key search terms")));
    }

    #[tokio::test]
    async fn keywords_that_sanitise_to_nothing_fall_back_to_direct() {
        let store = store_with(&["Dentist appointment Tuesday"]).await;
        let provider = Arc::new(MockQueryProvider::always("(*), ^"));
        let r = retriever(store, Arc::new(FailingEmbedder::new()), FtsStrategy::Keywords)
            .with_query_provider(provider, Model::new("test", "tool"));

        let response = r.retrieve("dentist", &CancellationToken::new()).await.unwrap();
        assert_eq!(response.results.len(), 1);
        assert!(response.results[0].item.text.starts_with("Dentist"));
    }

    #[tokio::test]
    async fn transform_responses_are_used_once_each() {
        let store = store_with(&["Prefers tabs over spaces"]).await;
        let embedder = Arc::new(KeywordEmbedder::new());
        let provider = Arc::new(MockQueryProvider::with_responses(vec![
            "ANSWER: you prefer tabs\nREPHRASE: indentation preference".into(),
        ]));
        let r = retriever(store, embedder.clone(), FtsStrategy::Direct)
            .with_query_provider(provider.clone(), Model::new("test", "tool"));
        let cancel = CancellationToken::new();

        r.retrieve("tabs?", &cancel).await.unwrap();
        assert_eq!(embedder.calls(), 3);

        // Queue drained: the blank default leaves only the raw query.
        r.retrieve("tabs?", &cancel).await.unwrap();
        assert_eq!(embedder.calls(), 4);

        provider.add_response("ANSWER: tabs\nREPHRASE: tab width").await;
        r.retrieve("tabs?", &cancel).await.unwrap();
        assert_eq!(embedder.calls(), 7);
        assert_eq!(provider.prompts().await.len(), 3);
    }

    #[tokio::test]
    async fn summary_strategy_falls_back_to_direct_on_failure() {
        let store = store_with(&["Birthday party on Saturday"]).await;
        let r = retriever(store, Arc::new(FailingEmbedder::new()), FtsStrategy::Summary)
            .with_query_provider(Arc::new(MockQueryProvider::failing()), Model::new("test", "tool"));

        let response = r.retrieve("birthday plans", &CancellationToken::new()).await.unwrap();
        assert_eq!(response.results.len(), 1);
    }

    #[tokio::test]
    async fn auto_strategy_widens_sparse_results() {
        let store = store_with(&["Cat named Whiskers", "Dog named Rex"]).await;
        let provider = Arc::new(MockQueryProvider::always("Dog pets"));
        let r = retriever(store, Arc::new(FailingEmbedder::new()), FtsStrategy::Auto)
            .with_query_provider(provider.clone(), Model::new("test", "tool"));

        let response = r.retrieve("Whiskers", &CancellationToken::new()).await.unwrap();
        assert!(provider.prompts().await.iter().any(|p| p.starts_with("Summarize this query")));
        let texts: Vec<&str> = response.results.iter().map(|res| res.item.text.as_str()).collect();
        assert_eq!(texts.len(), 2);
        assert!(texts.contains(&"Cat named Whiskers"));
        assert!(texts.contains(&"Dog named Rex"));
    }

    #[tokio::test]
    async fn auto_strategy_skips_summary_when_direct_hits_suffice() {
        let store = store_with(&[
            "Standup moved to Monday",
            "Standup notes are in the wiki",
            "Skip standup on holidays",
            "Standup runs fifteen minutes",
            "Remote standup link is pinned",
        ])
        .await;
        let provider = Arc::new(MockQueryProvider::always("Dog pets"));
        let r = retriever(store, Arc::new(FailingEmbedder::new()), FtsStrategy::Auto)
            .with_query_provider(provider.clone(), Model::new("test", "tool"));

        let response = r.retrieve("standup", &CancellationToken::new()).await.unwrap();
        assert_eq!(response.results.len(), 5);
        let prompts = provider.prompts().await;
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("User query: standup"));
        assert!(!prompts.iter().any(|p| p.starts_with("Summarize this query")));
    }

    #[tokio::test]
    async fn both_paths_failing_is_an_error() {
        let db = Database::open_in_memory().await.unwrap();
        let store = Arc::new(MemoryStore::from_database(&db).unwrap());
        db.connection()
            .call(|conn| conn.execute_batch("DROP TABLE memories_fts"))
            .await
            .unwrap();
        let r = retriever(store, Arc::new(FailingEmbedder::new()), FtsStrategy::Direct);

        let err = r.retrieve("anything", &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, MnemoError::Retrieval { .. }), "got {err}");
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let store = store_with(&["x marks"]).await;
        let r = retriever(store, Arc::new(KeywordEmbedder::new()), FtsStrategy::Direct);
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(r.retrieve("marks", &cancel).await.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn history_search_uses_direct_tokens() {
        let store = store_with(&[]).await;
        store
            .save_history(crate::types::HistoryItem::new("user", "Remind me about the marathon"))
            .await
            .unwrap();
        let r = retriever(store, Arc::new(KeywordEmbedder::new()), FtsStrategy::Keywords);

        assert_eq!(r.retrieve_history("marathon?").await.unwrap().len(), 1);
        assert!(r.retrieve_history("?").await.unwrap().is_empty());
    }
}
