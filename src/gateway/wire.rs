//! Wire format for the gateway's invoke endpoint

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ToolErrorKind;
use crate::tools::{ToolInvocation, ToolResult};

/// Header carrying the invocation id alongside the body
pub const INVOCATION_ID_HEADER: &str = "x-invocation-id";

/// Body of `POST /invoke`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeRequest {
    pub tool: String,
    pub arguments: Map<String, Value>,
    pub invocation_id: String,
}

impl From<&ToolInvocation> for InvokeRequest {
    fn from(invocation: &ToolInvocation) -> Self {
        Self {
            tool: invocation.tool.clone(),
            arguments: invocation.arguments.clone(),
            invocation_id: invocation.invocation_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvokeStatus {
    Success,
    Error,
}

/// Body returned by `POST /invoke`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeResponse {
    pub invocation_id: String,
    pub status: InvokeStatus,
    #[serde(default)]
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl InvokeResponse {
    /// Convert into a result; the remote error message is passed through verbatim
    pub fn into_result(self) -> ToolResult {
        match self.status {
            InvokeStatus::Success => ToolResult::success(self.invocation_id, self.payload),
            InvokeStatus::Error => ToolResult::failure(
                self.invocation_id,
                ToolErrorKind::RemoteToolError,
                self.error_message.unwrap_or_default(),
            ),
        }
    }
}
