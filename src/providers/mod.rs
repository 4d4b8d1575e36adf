use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::AppResult;

pub mod groq;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub content: String,
    pub model: String,
    pub token_usage: Value,
}

/// A chat-completion backend that returns one non-streamed text reply.
pub trait CompletionProvider: Send + Sync {
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = AppResult<Completion>> + Send;
}
