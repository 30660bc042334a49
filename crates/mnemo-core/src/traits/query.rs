// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query provider trait for LLM-assisted query transformation.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use crate::error::MnemoError;
use crate::types::Model;

/// A stream of text chunks produced by a chat model.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<String, MnemoError>> + Send>>;

/// Capability for sending a single-turn prompt to a chat model.
///
/// The retriever only needs the concatenated response, but providers stream
/// natively so the trait mirrors that.
#[async_trait]
pub trait QueryProvider: Send + Sync {
    /// Sends `prompt` as one user message and streams the response chunks.
    async fn chat_stream(&self, model: &Model, prompt: &str) -> Result<ChatStream, MnemoError>;
}

/// Drains a chat stream into a single string.
///
/// The first chunk error aborts collection and is returned as-is.
pub async fn collect_response(mut stream: ChatStream) -> Result<String, MnemoError> {
    let mut response = String::new();
    while let Some(chunk) = stream.next().await {
        response.push_str(&chunk?);
    }
    Ok(response)
}
