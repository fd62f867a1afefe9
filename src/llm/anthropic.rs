//! Anthropic API client implementation
//!
//! Implements LlmClient for the Anthropic Messages API. The client only
//! packages prompts and tool definitions and unpacks the reply.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{Value, json};

use crate::config::LlmConfig;
use crate::error::{McpflowError, Result};
use crate::llm::client::LlmClient;
use crate::llm::tool_parser;
use crate::llm::types::{CompletionRequest, CompletionResponse, Usage};

/// Anthropic API version
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic API client
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    max_tokens: u32,
    usage: Arc<Mutex<Usage>>,
}

impl AnthropicClient {
    /// Create a new Anthropic client
    ///
    /// Reads the API key from the environment variable named in the config
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| McpflowError::Llm(format!("{} not set", config.api_key_env)))?;

        Self::with_api_key(api_key, config)
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(api_key: String, config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| McpflowError::Llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            api_url: config.api_url.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            usage: Arc::new(Mutex::new(Usage::default())),
        })
    }

    /// Build the request body for the Anthropic API
    fn build_request(&self, request: &CompletionRequest) -> Value {
        let max_tokens = request.max_tokens.unwrap_or(self.max_tokens);

        let mut body = json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "messages": [{"role": "user", "content": request.transcript}]
        });

        if !request.system.is_empty() {
            body["system"] = json!(request.system);
        }

        if !request.tools.is_empty() {
            let tools: Vec<Value> = request.tools.iter().map(|t| t.to_anthropic_schema()).collect();
            body["tools"] = json!(tools);
        }

        body
    }

    /// Parse the API response and track cumulative usage
    fn parse_response(&self, body: &Value) -> Result<CompletionResponse> {
        let response = tool_parser::parse_response(body)?;
        self.usage
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .add(&response.usage);
        Ok(response)
    }

    async fn send_request(&self, body: Value) -> Result<Value> {
        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| McpflowError::Llm(format!("Request failed: {}", e)))?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(McpflowError::Llm(format!(
                "Rate limited, retry after {} seconds",
                retry_after
            )));
        }

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(McpflowError::Llm(format!("API error {}: {}", status, error_body)));
        }

        response
            .json()
            .await
            .map_err(|e| McpflowError::Llm(format!("Failed to parse response: {}", e)))
    }

    /// Get cumulative token usage
    pub fn total_usage(&self) -> Usage {
        self.usage.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = self.build_request(&request);
        debug!("LLM request: {} transcript bytes, {} tools", request.transcript.len(), request.tools.len());
        let response = self.send_request(body).await?;
        self.parse_response(&response)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_ready(&self) -> bool {
        !self.api_key.is_empty()
    }
}

impl std::fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ToolDefinition;

    fn client() -> AnthropicClient {
        AnthropicClient::with_api_key("test-key".to_string(), &LlmConfig::default()).unwrap()
    }

    #[test]
    fn test_missing_api_key_env() {
        let config = LlmConfig {
            api_key_env: "MCPFLOW_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        let err = AnthropicClient::new(&config).unwrap_err();
        assert!(err.to_string().contains("MCPFLOW_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_client_with_api_key() {
        let client = client();
        assert!(client.is_ready());
        assert_eq!(client.model(), LlmConfig::default().model);
    }

    #[test]
    fn test_build_request_basic() {
        let request = CompletionRequest::new("You are the orchestrator", "user: hi");
        let body = client().build_request(&request);

        assert_eq!(body["model"], LlmConfig::default().model);
        assert_eq!(body["max_tokens"], LlmConfig::default().max_tokens);
        assert_eq!(body["system"], "You are the orchestrator");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "user: hi");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_build_request_with_tools() {
        let tool = ToolDefinition::new("git_status", "status", json!({"type": "object", "properties": {}}));
        let request = CompletionRequest::new("s", "x").with_tools(vec![tool]);
        let body = client().build_request(&request);
        assert_eq!(body["tools"][0]["name"], "git_status");
    }

    #[test]
    fn test_total_usage_accumulation() {
        let client = client();
        client
            .parse_response(&json!({"content": [], "usage": {"input_tokens": 100, "output_tokens": 50}}))
            .unwrap();
        client
            .parse_response(&json!({"content": [], "usage": {"input_tokens": 200, "output_tokens": 100}}))
            .unwrap();
        assert_eq!(client.total_usage(), Usage::new(300, 150));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let debug_str = format!("{:?}", client());
        assert!(debug_str.contains("AnthropicClient"));
        assert!(!debug_str.contains("test-key"));
    }

    #[test]
    fn test_empty_api_key_not_ready() {
        let client = AnthropicClient::with_api_key(String::new(), &LlmConfig::default()).unwrap();
        assert!(!client.is_ready());
    }
}
