// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock embedding providers.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use mnemo_core::{EmbeddingProvider, MnemoError, Model};

/// Words that put a text on the "C++ object model" axis.
const TOPIC_KEYWORDS: &[&str] = &["virtual", "polymorphism", "inheritance", "c++"];

/// Embeds onto two axes: `[1, 0]` for C++ object-model texts, `[0, 1]` otherwise.
///
/// Matching is case-insensitive.
#[derive(Debug, Default)]
pub struct KeywordEmbedder {
    calls: AtomicUsize,
    advertised_dimensions: Option<usize>,
}

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `dimensions` from [`EmbeddingProvider::dimensions`] while still
    /// returning two-element vectors, like a provider that guesses the size
    /// of an unknown model.
    pub fn advertising_dimensions(dimensions: usize) -> Self {
        Self {
            advertised_dimensions: Some(dimensions),
            ..Self::default()
        }
    }

    /// Number of `embed` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector_for(text: &str) -> Vec<f32> {
        let lower = text.to_lowercase();
        if TOPIC_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            vec![1.0, 0.0]
        } else {
            vec![0.0, 1.0]
        }
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, _model: &Model, text: &str) -> Result<Vec<f32>, MnemoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector_for(text))
    }

    fn dimensions(&self, _model: &Model) -> usize {
        self.advertised_dimensions.unwrap_or(2)
    }
}

/// Fails `embed` for selected texts (or all texts) and records every attempt.
///
/// Texts that are not selected are embedded like [`KeywordEmbedder`].
/// Attempt times use `tokio::time::Instant`, so they follow a paused clock.
#[derive(Debug, Default)]
pub struct FailingEmbedder {
    only: Option<Vec<String>>,
    attempts: Arc<Mutex<Vec<(String, Instant)>>>,
}

impl FailingEmbedder {
    /// Fails every call.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails only calls whose text equals one of `texts`.
    pub fn for_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            only: Some(texts.into_iter().map(Into::into).collect()),
            attempts: Arc::default(),
        }
    }

    /// Every attempt so far, in call order.
    pub async fn attempts(&self) -> Vec<(String, Instant)> {
        self.attempts.lock().await.clone()
    }

    /// Attempt times for one text.
    pub async fn attempts_for(&self, text: &str) -> Vec<Instant> {
        self.attempts
            .lock()
            .await
            .iter()
            .filter(|(t, _)| t == text)
            .map(|(_, at)| *at)
            .collect()
    }

    fn should_fail(&self, text: &str) -> bool {
        self.only
            .as_ref()
            .is_none_or(|texts| texts.iter().any(|t| t == text))
    }
}

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _model: &Model, text: &str) -> Result<Vec<f32>, MnemoError> {
        self.attempts
            .lock()
            .await
            .push((text.to_string(), Instant::now()));
        if self.should_fail(text) {
            return Err(MnemoError::provider("rate limit exceeded"));
        }
        Ok(KeywordEmbedder::vector_for(text))
    }

    fn dimensions(&self, _model: &Model) -> usize {
        2
    }
}

/// Fails the first `failures` calls for each distinct text, then succeeds.
#[derive(Debug)]
pub struct FlakyEmbedder {
    failures: usize,
    seen: Mutex<HashMap<String, usize>>,
}

impl FlakyEmbedder {
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Calls made for one text.
    pub async fn calls_for(&self, text: &str) -> usize {
        self.seen.lock().await.get(text).copied().unwrap_or(0)
    }
}

#[async_trait]
impl EmbeddingProvider for FlakyEmbedder {
    async fn embed(&self, _model: &Model, text: &str) -> Result<Vec<f32>, MnemoError> {
        let call = {
            let mut seen = self.seen.lock().await;
            let count = seen.entry(text.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        if call <= self.failures {
            return Err(MnemoError::provider(format!("transient failure {call}")));
        }
        Ok(KeywordEmbedder::vector_for(text))
    }

    fn dimensions(&self, _model: &Model) -> usize {
        2
    }
}
