//! Role transitions
//!
//! [`decide`] is a pure function of the turn log and workflow limits. The
//! runner calls it before every turn and does whatever it says.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::WorkflowConfig;
use crate::error::ToolErrorKind;

use super::role::AgentRole;
use super::state::{ConversationState, Turn};

/// Why a conversation ended without an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    TurnLimit,
    Cancelled,
    Llm,
    Tool(ToolErrorKind),
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TurnLimit => f.write_str("turn_limit"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Llm => f.write_str("llm"),
            Self::Tool(kind) => write!(f, "tool:{}", kind),
        }
    }
}

/// What happens next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Activate(AgentRole),
    Complete(String),
    Fail(FailureKind, String),
}

/// Named edge of the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionReason {
    TaskReceived,
    PlanProduced,
    ToolCallsIssued,
    ToolResultsReturned,
    ToolsBlocked,
    ImplementationReported,
    ExplicitRoute,
    AnswerAccepted,
    TurnLimitReached,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub step: Step,
    pub reason: TransitionReason,
}

impl Transition {
    fn activate(role: AgentRole, reason: TransitionReason) -> Self {
        Self {
            step: Step::Activate(role),
            reason,
        }
    }
}

/// Decide the next step from the conversation so far
pub fn decide(state: &ConversationState, config: &WorkflowConfig) -> Transition {
    let transition = match state.last_turn() {
        None => Transition::activate(AgentRole::Orchestrator, TransitionReason::TaskReceived),
        Some(turn) if turn.is_tool_execution() => after_tools(state, turn, config),
        Some(turn) => after_agent(state, turn),
    };

    if matches!(transition.step, Step::Activate(_)) && state.len() >= config.max_turns {
        return Transition {
            step: Step::Fail(
                FailureKind::TurnLimit,
                format!("turn limit of {} reached", config.max_turns),
            ),
            reason: TransitionReason::TurnLimitReached,
        };
    }
    transition
}

fn after_agent(state: &ConversationState, turn: &Turn) -> Transition {
    if !turn.tool_calls.is_empty() {
        return Transition::activate(AgentRole::ToolExecutor, TransitionReason::ToolCallsIssued);
    }

    // A role routing to itself is just answering
    if let Some(target) = turn.route.filter(|target| *target != turn.role) {
        return Transition::activate(target, TransitionReason::ExplicitRoute);
    }

    match turn.role {
        AgentRole::Orchestrator if state.has_plan() => Transition {
            step: Step::Complete(turn.content.clone()),
            reason: TransitionReason::AnswerAccepted,
        },
        AgentRole::Orchestrator => Transition::activate(AgentRole::Planner, TransitionReason::TaskReceived),
        AgentRole::Planner => Transition::activate(AgentRole::Coder, TransitionReason::PlanProduced),
        AgentRole::Coder => Transition::activate(AgentRole::Orchestrator, TransitionReason::ImplementationReported),
        AgentRole::ToolExecutor => Transition::activate(AgentRole::Orchestrator, TransitionReason::ToolResultsReturned),
    }
}

fn after_tools(state: &ConversationState, turn: &Turn, config: &WorkflowConfig) -> Transition {
    let issuer = turn.acting_role();
    let failures = state.consecutive_tool_failures();

    if config.max_consecutive_tool_failures > 0 && failures >= config.max_consecutive_tool_failures {
        if issuer == AgentRole::Orchestrator {
            let (kind, detail) = turn
                .exchanges
                .iter()
                .find_map(|e| e.failure_kind().map(|k| (k, e.output.render())))
                .unwrap_or((ToolErrorKind::RemoteToolError, String::new()));
            return Transition {
                step: Step::Fail(
                    FailureKind::Tool(kind),
                    format!("tool calls failed {} turns in a row; last: {}", failures, detail),
                ),
                reason: TransitionReason::ToolsBlocked,
            };
        }
        return Transition::activate(AgentRole::Orchestrator, TransitionReason::ToolsBlocked);
    }

    Transition::activate(issuer, TransitionReason::ToolResultsReturned)
}
