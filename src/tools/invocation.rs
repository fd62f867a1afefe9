//! Invocation and result records exchanged across the gateway boundary

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ToolErrorKind;
use crate::id::generate_invocation_id;

/// One validated call to a remote tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Correlates the gateway's answer with this call
    pub invocation_id: String,
    /// Tool name
    pub tool: String,
    /// Arguments in the order they were supplied
    pub arguments: Map<String, Value>,
    /// Maximum time to wait for the result
    pub deadline: Duration,
}

impl ToolInvocation {
    /// Create an invocation with a fresh identifier
    pub fn new(tool: impl Into<String>, arguments: Map<String, Value>, deadline: Duration) -> Self {
        Self {
            invocation_id: generate_invocation_id(),
            tool: tool.into(),
            arguments,
            deadline,
        }
    }

    /// Replace the generated identifier
    pub fn with_id(mut self, invocation_id: impl Into<String>) -> Self {
        self.invocation_id = invocation_id.into();
        self
    }
}

/// Why an invocation failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub kind: ToolErrorKind,
    pub message: String,
}

impl ToolFailure {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Success payload or failure descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolOutcome {
    Success(Value),
    Failure(ToolFailure),
}

/// Final answer for exactly one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub invocation_id: String,
    pub outcome: ToolOutcome,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(invocation_id: impl Into<String>, payload: Value) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            outcome: ToolOutcome::Success(payload),
        }
    }

    /// Create a failed tool result
    pub fn failure(invocation_id: impl Into<String>, kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            outcome: ToolOutcome::Failure(ToolFailure::new(kind, message)),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Success(_))
    }

    pub fn failure_kind(&self) -> Option<ToolErrorKind> {
        match &self.outcome {
            ToolOutcome::Success(_) => None,
            ToolOutcome::Failure(failure) => Some(failure.kind),
        }
    }
}
