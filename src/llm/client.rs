//! LLM client trait and a scripted mock
//!
//! Every call is independent; the conversation runner rebuilds the full
//! transcript for each turn.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{McpflowError, Result};

use super::types::{CompletionRequest, CompletionResponse};

/// Stateless LLM client
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single completion request
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Model identifier used for requests
    fn model(&self) -> &str;

    /// Whether the client has what it needs to make calls
    fn is_ready(&self) -> bool {
        true
    }
}

/// Client that replays canned responses in order
///
/// Every request is recorded so tests can inspect what each role was shown.
/// Running out of responses is an error.
#[derive(Debug, Default)]
pub struct MockLlmClient {
    responses: Mutex<VecDeque<CompletionResponse>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlmClient {
    /// Create a new mock with the responses to hand out
    pub fn new(responses: Vec<CompletionResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Responses not yet handed out
    pub fn remaining(&self) -> usize {
        self.responses.lock().map(|r| r.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        self.responses
            .lock()
            .map_err(|_| McpflowError::Llm("mock response queue poisoned".to_string()))?
            .pop_front()
            .ok_or_else(|| McpflowError::Llm("mock has no more responses".to_string()))
    }

    fn model(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_replays_in_order() {
        let client = MockLlmClient::new(vec![CompletionResponse::text("first"), CompletionResponse::text("second")]);

        let a = client.complete(CompletionRequest::new("s", "t")).await.unwrap();
        let b = client.complete(CompletionRequest::new("s", "t")).await.unwrap();

        assert_eq!(a.content, "first");
        assert_eq!(b.content, "second");
        assert_eq!(client.remaining(), 0);
        assert_eq!(client.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_mock_exhausted() {
        let client = MockLlmClient::new(vec![]);
        let result = client.complete(CompletionRequest::new("s", "t")).await;
        assert!(matches!(result, Err(McpflowError::Llm(_))));
    }

    #[test]
    fn test_mock_is_ready() {
        let client = MockLlmClient::default();
        assert!(client.is_ready());
        assert_eq!(client.model(), "mock");
    }
}
