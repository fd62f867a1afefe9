//! Workflow - routing state machine over the agent roles
//!
//! Orchestrator, planner and coder take turns; a tool executor runs whatever
//! gateway calls the active role issues. The conversation log is append-only
//! and every transition is decided from it.

mod cancel;
mod role;
mod routing;
mod runner;
mod state;
mod transition;

pub use cancel::{CancelHandle, CancelToken, cancel_pair};
pub use role::AgentRole;
pub use routing::{
    ROUTE_TO_CODER, ROUTE_TO_ORCHESTRATOR, ROUTE_TO_PLANNER, is_routing_tool, route_target, routing_tool_definitions,
    split_tool_calls,
};
pub use runner::{ConversationOutcome, ConversationReport, ConversationRunner, RunnerConfig};
pub use state::{ConversationState, ToolExchange, Turn};
pub use transition::{FailureKind, Step, Transition, TransitionReason, decide};
