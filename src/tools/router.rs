//! Tool routing and execution
//!
//! Defines the ToolRouter trait the workflow dispatches through, plus
//! `dispatch_all` which runs one turn's invocations concurrently and
//! matches results back by invocation id.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, warn};
use serde_json::Value;

use crate::error::ToolErrorKind;

use super::invocation::{ToolInvocation, ToolResult};

/// Trait for routing validated invocations to wherever tools execute
#[async_trait]
pub trait ToolRouter: Send + Sync {
    /// Execute one invocation; failures come back as a failed result, never as an error
    async fn execute(&self, invocation: ToolInvocation) -> ToolResult;
}

/// Run all invocations of a turn concurrently and wait for every result
///
/// Results come back in the order the invocations were given, matched by
/// invocation id rather than arrival order. A router answer carrying an
/// unexpected id is discarded and the invocation it should have answered
/// gets a `TransportError` result instead.
pub async fn dispatch_all<R>(router: &R, invocations: &[ToolInvocation]) -> Vec<ToolResult>
where
    R: ToolRouter + ?Sized,
{
    let answers = join_all(invocations.iter().cloned().map(|inv| router.execute(inv))).await;

    let mut by_id: HashMap<String, ToolResult> = HashMap::with_capacity(answers.len());
    for answer in answers {
        if by_id.contains_key(&answer.invocation_id) {
            warn!("Duplicate result for invocation {}, keeping the first", answer.invocation_id);
            continue;
        }
        by_id.insert(answer.invocation_id.clone(), answer);
    }

    invocations
        .iter()
        .map(|inv| {
            by_id.remove(&inv.invocation_id).unwrap_or_else(|| {
                ToolResult::failure(
                    inv.invocation_id.clone(),
                    ToolErrorKind::TransportError,
                    "no result correlated with this invocation",
                )
            })
        })
        .inspect(|result| debug!("Invocation {} resolved (success: {})", result.invocation_id, result.is_success()))
        .collect()
}

/// Scripted router for tests and offline runs
///
/// Responds per tool name with a fixed payload after an optional delay and
/// records every invocation it receives.
#[derive(Debug, Default)]
pub struct MockToolRouter {
    responses: HashMap<String, (Value, Duration)>,
    executed: Mutex<Vec<ToolInvocation>>,
}

impl MockToolRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predefined response for a tool
    pub fn with_response(self, tool_name: &str, payload: Value) -> Self {
        self.with_delayed_response(tool_name, payload, Duration::ZERO)
    }

    /// Add a predefined response delivered after `delay`
    pub fn with_delayed_response(mut self, tool_name: &str, payload: Value, delay: Duration) -> Self {
        self.responses.insert(tool_name.to_string(), (payload, delay));
        self
    }

    /// Invocations received so far, in arrival order
    pub fn executed(&self) -> Vec<ToolInvocation> {
        self.executed.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ToolRouter for MockToolRouter {
    async fn execute(&self, invocation: ToolInvocation) -> ToolResult {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(invocation.clone());
        }
        match self.responses.get(&invocation.tool) {
            Some((payload, delay)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(*delay).await;
                }
                ToolResult::success(invocation.invocation_id, payload.clone())
            }
            None => ToolResult::failure(
                invocation.invocation_id,
                ToolErrorKind::RemoteToolError,
                format!("No mock response configured for tool: {}", invocation.tool),
            ),
        }
    }
}
