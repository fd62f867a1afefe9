//! Error types for mcpflow
//!
//! Centralized error handling using thiserror. Failures that cross the
//! gateway boundary are classified by [`ToolErrorKind`] so the workflow can
//! reason about them without string matching.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of failures at the tool-dispatch boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// Catalog listing endpoint could not be reached
    GatewayUnreachable,
    /// A catalog entry lacked a name or schema, or the listing was not a catalog
    MalformedCatalog,
    /// Caller-supplied arguments did not satisfy the tool's schema
    SchemaViolation,
    /// The invocation deadline lapsed
    Timeout,
    /// Network or protocol fault talking to the gateway
    TransportError,
    /// The remote tool itself reported failure
    RemoteToolError,
    /// The requested tool is not in the current catalog snapshot
    UnknownTool,
}

impl ToolErrorKind {
    /// Only transport faults are worth an automatic retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransportError)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GatewayUnreachable => "gateway_unreachable",
            Self::MalformedCatalog => "malformed_catalog",
            Self::SchemaViolation => "schema_violation",
            Self::Timeout => "timeout",
            Self::TransportError => "transport_error",
            Self::RemoteToolError => "remote_tool_error",
            Self::UnknownTool => "unknown_tool",
        }
    }
}

impl fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All error types that can occur in mcpflow
#[derive(Debug, Error)]
pub enum McpflowError {
    /// Gateway listing or health endpoint could not be reached
    #[error("Gateway unreachable: {0}")]
    GatewayUnreachable(String),

    /// Catalog listing could not be turned into tool descriptors
    #[error("Malformed catalog: {0}")]
    MalformedCatalog(String),

    /// Arguments rejected by a tool adapter before any network call
    #[error("Schema violation for tool '{tool}': parameter '{parameter}' {reason}")]
    SchemaViolation {
        tool: String,
        parameter: String,
        reason: String,
    },

    /// Tool name not present in the registry
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// LLM API error
    #[error("LLM error: {0}")]
    Llm(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl McpflowError {
    /// Boundary classification, if this error originated at the tool boundary
    pub fn kind(&self) -> Option<ToolErrorKind> {
        match self {
            Self::GatewayUnreachable(_) => Some(ToolErrorKind::GatewayUnreachable),
            Self::MalformedCatalog(_) => Some(ToolErrorKind::MalformedCatalog),
            Self::SchemaViolation { .. } => Some(ToolErrorKind::SchemaViolation),
            Self::UnknownTool(_) => Some(ToolErrorKind::UnknownTool),
            _ => None,
        }
    }
}

/// Result type alias for mcpflow operations
pub type Result<T> = std::result::Result<T, McpflowError>;
