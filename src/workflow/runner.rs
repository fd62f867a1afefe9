//! Conversation runner - drives one conversation to a terminal state.
//!
//! Each step asks [`decide`] what happens next. Agent turns call the LLM with
//! the full transcript; tool execution turns validate every call through its
//! adapter, dispatch the valid ones concurrently and wait for all of them
//! before the log advances.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::config::{Config, WorkflowConfig};
use crate::error::ToolErrorKind;
use crate::id::generate_invocation_id;
use crate::llm::{CompletionRequest, LlmClient, StopReason, ToolCall};
use crate::tools::{ToolAdapter, ToolInvocation, ToolOutput, ToolRegistry, ToolResult, ToolRouter, dispatch_all};

use super::cancel::CancelToken;
use super::role::AgentRole;
use super::routing::{routing_tool_definitions, split_tool_calls};
use super::state::{ConversationState, ToolExchange, Turn};
use super::transition::{FailureKind, Step, decide};

/// How a conversation ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversationOutcome {
    Completed {
        answer: String,
    },
    Failed {
        kind: FailureKind,
        message: String,
        /// Invocations left in flight when the conversation stopped
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        abandoned: Vec<String>,
    },
}

impl ConversationOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Final state log plus outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationReport {
    pub state: ConversationState,
    pub outcome: ConversationOutcome,
}

/// Configuration for the ConversationRunner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Maximum tokens for LLM responses
    pub max_tokens: u32,
    /// Deadline applied to every tool invocation
    pub tool_deadline: Duration,
    pub workflow: WorkflowConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl RunnerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_tokens: config.llm.max_tokens,
            tool_deadline: config.gateway.default_deadline(),
            workflow: config.workflow.clone(),
        }
    }
}

/// Why a turn could not be taken
enum Halt {
    Cancelled { abandoned: Vec<String> },
    Llm(String),
}

/// A prepared call waiting for dispatch
struct Pending {
    slot: usize,
    call: ToolCall,
    adapter: ToolAdapter,
    invocation: ToolInvocation,
}

/// ConversationRunner drives the role state machine for one request at a time.
pub struct ConversationRunner<L, R>
where
    L: LlmClient,
    R: ToolRouter,
{
    llm: Arc<L>,
    router: Arc<R>,
    registry: Arc<ToolRegistry>,
    config: RunnerConfig,
}

impl<L, R> ConversationRunner<L, R>
where
    L: LlmClient,
    R: ToolRouter,
{
    /// Create a new runner with default configuration
    pub fn new(llm: Arc<L>, router: Arc<R>, registry: Arc<ToolRegistry>) -> Self {
        Self::with_config(llm, router, registry, RunnerConfig::default())
    }

    /// Create a new runner with custom configuration
    pub fn with_config(llm: Arc<L>, router: Arc<R>, registry: Arc<ToolRegistry>, config: RunnerConfig) -> Self {
        Self {
            llm,
            router,
            registry,
            config,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run a conversation to completion
    pub async fn run(&self, request: impl Into<String>) -> ConversationReport {
        self.run_with_cancel(request, CancelToken::never()).await
    }

    /// Run a conversation that stops early once `cancel` fires
    pub async fn run_with_cancel(&self, request: impl Into<String>, cancel: CancelToken) -> ConversationReport {
        let mut state = ConversationState::new(request);
        info!("Conversation {} started with model {}", state.id(), self.llm.model());

        if !self.llm.is_ready() {
            return self.finish_failed(state, FailureKind::Llm, "LLM client is not ready".to_string(), Vec::new());
        }

        loop {
            if cancel.is_cancelled() {
                return self.finish_failed(state, FailureKind::Cancelled, "cancelled".to_string(), Vec::new());
            }

            let transition = decide(&state, &self.config.workflow);
            debug!("Conversation {}: {:?} ({:?})", state.id(), transition.step, transition.reason);

            let taken = match transition.step {
                Step::Complete(answer) => {
                    info!("Conversation {} completed after {} turns", state.id(), state.len());
                    return ConversationReport {
                        state,
                        outcome: ConversationOutcome::Completed { answer },
                    };
                }
                Step::Fail(kind, message) => return self.finish_failed(state, kind, message, Vec::new()),
                Step::Activate(AgentRole::ToolExecutor) => self.execute_tools(&state, &cancel).await,
                Step::Activate(role) => self.agent_turn(role, &state, &cancel).await,
            };

            match taken {
                Ok(turn) => {
                    state.append(turn);
                }
                Err(Halt::Cancelled { abandoned }) => {
                    return self.finish_failed(state, FailureKind::Cancelled, "cancelled".to_string(), abandoned);
                }
                Err(Halt::Llm(message)) => return self.finish_failed(state, FailureKind::Llm, message, Vec::new()),
            }
        }
    }

    fn finish_failed(
        &self,
        state: ConversationState,
        kind: FailureKind,
        message: String,
        abandoned: Vec<String>,
    ) -> ConversationReport {
        if kind == FailureKind::Cancelled {
            warn!(
                "Conversation {} cancelled, {} invocation(s) abandoned",
                state.id(),
                abandoned.len()
            );
        } else {
            error!("Conversation {} failed ({}): {}", state.id(), kind, message);
        }
        ConversationReport {
            state,
            outcome: ConversationOutcome::Failed {
                kind,
                message,
                abandoned,
            },
        }
    }

    async fn agent_turn(
        &self,
        role: AgentRole,
        state: &ConversationState,
        cancel: &CancelToken,
    ) -> std::result::Result<Turn, Halt> {
        let mut tools = self.registry.snapshot().tool_definitions();
        tools.extend(routing_tool_definitions());

        let request = CompletionRequest::new(role.system_prompt(), state.transcript())
            .with_tools(tools)
            .with_max_tokens(self.config.max_tokens);

        let response = tokio::select! {
            response = self.llm.complete(request) => response,
            _ = cancel.cancelled() => return Err(Halt::Cancelled { abandoned: Vec::new() }),
        };
        let response = response.map_err(|e| Halt::Llm(e.to_string()))?;
        if response.stop_reason == StopReason::MaxTokens {
            warn!("{} hit the token limit, answer may be truncated", role);
        }

        let (tool_calls, route) = split_tool_calls(response.tool_calls);
        debug!(
            "{} answered with {} tool call(s){}",
            role,
            tool_calls.len(),
            route.map(|r| format!(", routing to {}", r)).unwrap_or_default()
        );
        Ok(Turn::agent(role, response.content, tool_calls, route))
    }

    async fn execute_tools(&self, state: &ConversationState, cancel: &CancelToken) -> std::result::Result<Turn, Halt> {
        let Some(issuing) = state.last_turn().filter(|t| !t.is_tool_execution()) else {
            warn!("Tool execution requested with no issuing turn");
            return Ok(Turn::tool_execution(AgentRole::Orchestrator, Vec::new()));
        };

        let snapshot = self.registry.snapshot();
        let mut slots: Vec<Option<ToolExchange>> = vec![None; issuing.tool_calls.len()];
        let mut pending = Vec::new();

        for (slot, call) in issuing.tool_calls.iter().enumerate() {
            let Some(adapter) = snapshot.adapter(&call.name) else {
                warn!("{} requested unknown tool '{}'", issuing.role, call.name);
                slots[slot] = Some(rejected(
                    call,
                    ToolErrorKind::UnknownTool,
                    format!("tool '{}' is not in the catalog", call.name),
                ));
                continue;
            };

            match adapter.prepare(call.input.clone(), self.config.tool_deadline) {
                Ok(invocation) => pending.push(Pending {
                    slot,
                    call: call.clone(),
                    adapter: adapter.clone(),
                    invocation,
                }),
                Err(e) => {
                    debug!("Rejected call to '{}': {}", call.name, e);
                    let kind = e.kind().unwrap_or(ToolErrorKind::SchemaViolation);
                    slots[slot] = Some(rejected(call, kind, e.to_string()));
                }
            }
        }

        let invocations: Vec<ToolInvocation> = pending.iter().map(|p| p.invocation.clone()).collect();
        let results = tokio::select! {
            results = dispatch_all(self.router.as_ref(), &invocations) => results,
            _ = cancel.cancelled() => {
                let abandoned = invocations.into_iter().map(|inv| inv.invocation_id).collect();
                return Err(Halt::Cancelled { abandoned });
            }
        };

        for (prepared, result) in pending.into_iter().zip(results) {
            let output = prepared.adapter.interpret(&result);
            slots[prepared.slot] = Some(ToolExchange {
                call: prepared.call,
                invocation: Some(prepared.invocation),
                result,
                output,
            });
        }

        Ok(Turn::tool_execution(issuing.role, slots.into_iter().flatten().collect()))
    }
}

/// Exchange for a call that never left the process
fn rejected(call: &ToolCall, kind: ToolErrorKind, message: String) -> ToolExchange {
    ToolExchange {
        call: call.clone(),
        invocation: None,
        result: ToolResult::failure(generate_invocation_id(), kind, message.clone()),
        output: ToolOutput::Failed { kind, message },
    }
}
