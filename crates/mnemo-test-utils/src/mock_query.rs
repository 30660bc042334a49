// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat provider for deterministic query-transformation tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream;
use tokio::sync::Mutex;

use mnemo_core::{ChatStream, MnemoError, Model, QueryProvider};

/// A chat provider that replays pre-configured responses.
///
/// Responses are popped from a FIFO queue. When the queue is empty the
/// default response is returned. Every prompt received is recorded.
pub struct MockQueryProvider {
    responses: Arc<Mutex<VecDeque<String>>>,
    default_response: Option<String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockQueryProvider {
    /// A provider whose default response is an empty string.
    pub fn new() -> Self {
        Self {
            responses: Arc::default(),
            default_response: Some(String::new()),
            prompts: Arc::default(),
        }
    }

    /// A provider pre-loaded with the given responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            ..Self::new()
        }
    }

    /// A provider that answers every prompt with `text`.
    pub fn always(text: impl Into<String>) -> Self {
        Self {
            default_response: Some(text.into()),
            ..Self::new()
        }
    }

    /// A provider whose every call fails.
    pub fn failing() -> Self {
        Self {
            default_response: None,
            ..Self::new()
        }
    }

    /// Add a response to the end of the queue.
    pub async fn add_response(&self, text: impl Into<String>) {
        self.responses.lock().await.push_back(text.into());
    }

    /// Prompts received so far, in order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    async fn next_response(&self) -> Option<String> {
        match self.responses.lock().await.pop_front() {
            Some(text) => Some(text),
            None => self.default_response.clone(),
        }
    }
}

impl Default for MockQueryProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QueryProvider for MockQueryProvider {
    async fn chat_stream(&self, _model: &Model, prompt: &str) -> Result<ChatStream, MnemoError> {
        self.prompts.lock().await.push(prompt.to_string());
        let text = self
            .next_response()
            .await
            .ok_or_else(|| MnemoError::provider("mock provider unavailable"))?;

        // One chunk per line, like a streaming API would deliver them.
        let chunks: Vec<Result<String, MnemoError>> =
            text.split_inclusive('\n').map(|line| Ok(line.to_string())).collect();
        Ok(Box::pin(stream::iter(chunks)))
    }
}
