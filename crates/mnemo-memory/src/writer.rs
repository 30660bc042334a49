// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Saving explicit memories ("remember this: ...").

use std::sync::Arc;

use mnemo_core::{EmbeddingProvider, MnemoError, Model};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::store::MemoryStore;
use crate::types::{MemoryItem, MemorySource};
use crate::vector::normalize;

/// Confidence used when the caller gives none or an out-of-range value.
pub const DEFAULT_CONFIDENCE: f64 = 1.0;

/// Embeds and stores memories the user asked to keep.
pub struct MemoryWriter {
    store: Arc<MemoryStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    model: Model,
}

impl MemoryWriter {
    pub fn new(store: Arc<MemoryStore>, embedder: Arc<dyn EmbeddingProvider>, model: Model) -> Self {
        Self {
            store,
            embedder,
            model,
        }
    }

    /// Embed `text` with the configured model and save it as an explicit memory.
    ///
    /// Returns the saved item, including its assigned id.
    pub async fn remember(
        &self,
        text: &str,
        tags: Vec<String>,
        confidence: Option<f64>,
        cancel: &CancellationToken,
    ) -> Result<MemoryItem, MnemoError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(MnemoError::InvalidInput("memory text is empty".into()));
        }
        let confidence = confidence
            .filter(|c| (0.0..=1.0).contains(c))
            .unwrap_or(DEFAULT_CONFIDENCE);

        let embedding = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(MnemoError::Cancelled),
            embedding = self.embedder.embed(&self.model, text) => embedding?,
        };
        let embedding = normalize(&embedding);

        let item = MemoryItem {
            text: text.to_string(),
            tags,
            source: MemorySource::Explicit,
            confidence,
            provider: self.model.provider.clone(),
            model_id: self.model.model_id.clone(),
            dim: embedding.len(),
            embedding,
            ..MemoryItem::default()
        };
        let saved = self.store.save_memory(item).await?;
        debug!(id = %saved.id, tags = saved.tags.len(), "explicit memory saved");
        Ok(saved)
    }
}

/// Split comma-separated tag input, trimming and dropping empty entries.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_storage::Database;
    use mnemo_test_utils::{FailingEmbedder, KeywordEmbedder};

    async fn writer(embedder: Arc<dyn EmbeddingProvider>) -> (MemoryWriter, Arc<MemoryStore>) {
        let db = Database::open_in_memory().await.unwrap();
        let store = Arc::new(MemoryStore::from_database(&db).unwrap());
        let writer = MemoryWriter::new(
            Arc::clone(&store),
            embedder,
            Model::new("test", "keyword"),
        );
        (writer, store)
    }

    #[test]
    fn parse_tags_skips_blanks() {
        assert_eq!(parse_tags("a, b,,c "), vec!["a", "b", "c"]);
        assert!(parse_tags("  ").is_empty());
        assert!(parse_tags("").is_empty());
    }

    #[tokio::test]
    async fn remember_saves_explicit_memory() {
        let (writer, store) = writer(Arc::new(KeywordEmbedder::new())).await;
        let saved = writer
            .remember(
                "  Prefers C++ inheritance over composition ",
                parse_tags("style, c++"),
                Some(0.7),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(saved.text, "Prefers C++ inheritance over composition");
        assert_eq!(saved.source, MemorySource::Explicit);
        assert_eq!(saved.confidence, 0.7);
        assert_eq!(saved.provider, "test");
        assert_eq!(saved.model_id, "keyword");
        assert_eq!(saved.dim, 2);
        assert_eq!(saved.embedding, vec![1.0, 0.0]);

        let loaded = store.get_memory(&saved.id).await.unwrap().unwrap();
        assert_eq!(loaded.tags, vec!["style", "c++"]);
    }

    #[tokio::test]
    async fn out_of_range_confidence_uses_default() {
        let (writer, _store) = writer(Arc::new(KeywordEmbedder::new())).await;
        let cancel = CancellationToken::new();
        for bad in [Some(1.5), Some(-0.1), Some(f64::NAN), None] {
            let saved = writer.remember("fact", vec![], bad, &cancel).await.unwrap();
            assert_eq!(saved.confidence, DEFAULT_CONFIDENCE);
        }
    }

    #[tokio::test]
    async fn empty_text_is_rejected() {
        let (writer, store) = writer(Arc::new(KeywordEmbedder::new())).await;
        let err = writer
            .remember("   ", vec![], None, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::InvalidInput(_)));
        assert_eq!(store.count_memories().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn embedding_failure_saves_nothing() {
        let (writer, store) = writer(Arc::new(FailingEmbedder::new())).await;
        let err = writer
            .remember("fact", vec![], None, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MnemoError::Provider { .. }));
        assert_eq!(store.count_memories().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn cancelled_write_saves_nothing() {
        let (writer, store) = writer(Arc::new(KeywordEmbedder::new())).await;
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = writer.remember("fact", vec![], None, &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(store.count_memories().await.unwrap(), 0);
    }
}
