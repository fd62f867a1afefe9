//! HTTP client for the MCP gateway
//!
//! Catalog discovery, health, and tool invocation with deadline and retry
//! policy. Invocation never returns an error: every outcome, including
//! transport faults and timeouts, is folded into a [`ToolResult`].

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use tokio::time::{Instant, timeout_at};

use crate::config::GatewayConfig;
use crate::error::{McpflowError, Result, ToolErrorKind};
use crate::tools::{ToolCatalog, ToolInvocation, ToolResult, ToolRouter};

use super::wire::{INVOCATION_ID_HEADER, InvokeRequest, InvokeResponse};

/// Cheap-to-clone handle on the gateway; clones share one connection pool
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: Client,
    base_url: String,
    max_retries: u32,
}

impl GatewayClient {
    /// Create a new client from gateway config
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| McpflowError::GatewayUnreachable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.effective_retries(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch the tool catalog from `GET /tools`
    pub async fn fetch_catalog(&self) -> Result<ToolCatalog> {
        let url = self.url("/tools");
        debug!("Fetching catalog from {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| McpflowError::GatewayUnreachable(format!("GET {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(McpflowError::GatewayUnreachable(format!("GET {} returned {}", url, status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| McpflowError::GatewayUnreachable(format!("GET {}: {}", url, e)))?;

        ToolCatalog::from_json(&body)
    }

    /// Probe `GET /health`; `Ok(false)` when the gateway answers with a non-2xx status
    pub async fn health(&self) -> Result<bool> {
        let url = self.url("/health");
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| McpflowError::GatewayUnreachable(format!("GET {}: {}", url, e)))?;
        Ok(response.status().is_success())
    }

    /// Invoke a tool, waiting at most the invocation's deadline
    ///
    /// The deadline covers every attempt. Only `TransportError` is retried,
    /// and only up to the configured retry count (never more than one).
    pub async fn invoke(&self, invocation: &ToolInvocation) -> ToolResult {
        let expires = Instant::now() + invocation.deadline;
        let mut retries = 0;

        loop {
            let result = match timeout_at(expires, self.attempt(invocation)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(
                        "Invocation {} of '{}' timed out after {}ms",
                        invocation.invocation_id,
                        invocation.tool,
                        invocation.deadline.as_millis()
                    );
                    return ToolResult::failure(
                        invocation.invocation_id.clone(),
                        ToolErrorKind::Timeout,
                        format!("no result within {}ms", invocation.deadline.as_millis()),
                    );
                }
            };

            match result.failure_kind() {
                Some(kind) if kind.is_retryable() && retries < self.max_retries => {
                    retries += 1;
                    warn!(
                        "Invocation {} of '{}' hit {}, retrying",
                        invocation.invocation_id, invocation.tool, kind
                    );
                }
                _ => return result,
            }
        }
    }

    async fn attempt(&self, invocation: &ToolInvocation) -> ToolResult {
        let id = invocation.invocation_id.clone();
        let transport = |message: String| ToolResult::failure(id.clone(), ToolErrorKind::TransportError, message);

        debug!("POST /invoke {} ({})", invocation.tool, invocation.invocation_id);
        let response = match self
            .http
            .post(self.url("/invoke"))
            .header(INVOCATION_ID_HEADER, &invocation.invocation_id)
            .json(&InvokeRequest::from(invocation))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return transport(format!("request failed: {}", e)),
        };

        let status = response.status();
        if !status.is_success() {
            return transport(format!("gateway returned {}", status));
        }

        let body: InvokeResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => return transport(format!("malformed invoke response: {}", e)),
        };

        if body.invocation_id != invocation.invocation_id {
            return transport(format!(
                "response for invocation {} does not match {}",
                body.invocation_id, invocation.invocation_id
            ));
        }

        body.into_result()
    }
}

#[async_trait]
impl ToolRouter for GatewayClient {
    async fn execute(&self, invocation: ToolInvocation) -> ToolResult {
        self.invoke(&invocation).await
    }
}
