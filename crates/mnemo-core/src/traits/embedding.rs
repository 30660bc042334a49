// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider trait for vector embedding generation.

use async_trait::async_trait;

use crate::error::MnemoError;
use crate::types::Model;

/// Capability for turning text into embedding vectors.
///
/// Implementations may return unnormalized vectors; callers normalize before
/// storing. Calls may block on network I/O and may fail transiently (rate
/// limits), so callers decide whether to retry.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a single text with the given model.
    async fn embed(&self, model: &Model, text: &str) -> Result<Vec<f32>, MnemoError>;

    /// Embeds several texts with the given model, preserving input order.
    async fn embed_batch(
        &self,
        model: &Model,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, MnemoError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(model, text).await?);
        }
        Ok(vectors)
    }

    /// Returns the vector length produced by the given model.
    fn dimensions(&self, model: &Model) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LengthEmbedder;

    #[async_trait]
    impl EmbeddingProvider for LengthEmbedder {
        async fn embed(&self, _model: &Model, text: &str) -> Result<Vec<f32>, MnemoError> {
            if text.is_empty() {
                return Err(MnemoError::provider("empty text"));
            }
            Ok(vec![text.len() as f32, 1.0])
        }

        fn dimensions(&self, _model: &Model) -> usize {
            2
        }
    }

    #[tokio::test]
    async fn default_batch_preserves_order() {
        let model = Model::new("test", "len");
        let texts = vec!["a".to_string(), "abc".to_string()];
        let vectors = LengthEmbedder.embed_batch(&model, &texts).await.unwrap();
        assert_eq!(vectors, vec![vec![1.0, 1.0], vec![3.0, 1.0]]);
    }

    #[tokio::test]
    async fn default_batch_fails_on_first_error() {
        let model = Model::new("test", "len");
        let texts = vec!["a".to_string(), String::new()];
        assert!(LengthEmbedder.embed_batch(&model, &texts).await.is_err());
    }
}
