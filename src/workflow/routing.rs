//! Routing pseudo-tools
//!
//! Offered to the LLM next to the gateway catalog and resolved locally. A
//! call to one of these never reaches the gateway.

use serde_json::json;

use crate::llm::{ToolCall, ToolDefinition};

use super::role::AgentRole;

pub const ROUTE_TO_PLANNER: &str = "route_to_planner";
pub const ROUTE_TO_CODER: &str = "route_to_coder";
pub const ROUTE_TO_ORCHESTRATOR: &str = "route_to_orchestrator";

/// Role a routing tool hands control to
pub fn route_target(tool_name: &str) -> Option<AgentRole> {
    match tool_name {
        ROUTE_TO_PLANNER => Some(AgentRole::Planner),
        ROUTE_TO_CODER => Some(AgentRole::Coder),
        ROUTE_TO_ORCHESTRATOR => Some(AgentRole::Orchestrator),
        _ => None,
    }
}

pub fn is_routing_tool(tool_name: &str) -> bool {
    route_target(tool_name).is_some()
}

/// Definitions advertised to every agent role
pub fn routing_tool_definitions() -> Vec<ToolDefinition> {
    [
        (ROUTE_TO_PLANNER, "Hand control to the planner agent"),
        (ROUTE_TO_CODER, "Hand control to the coder agent"),
        (ROUTE_TO_ORCHESTRATOR, "Hand control back to the orchestrator agent"),
    ]
    .into_iter()
    .map(|(name, description)| {
        ToolDefinition::new(
            name,
            description,
            json!({
                "type": "object",
                "properties": {
                    "reason": { "type": "string", "description": "Why control is being handed over" }
                }
            }),
        )
    })
    .collect()
}

/// Separate routing requests from gateway tool calls
///
/// The first routing call wins; gateway calls keep their order.
pub fn split_tool_calls(calls: Vec<ToolCall>) -> (Vec<ToolCall>, Option<AgentRole>) {
    let mut route = None;
    let mut gateway_calls = Vec::with_capacity(calls.len());
    for call in calls {
        match route_target(&call.name) {
            Some(target) => {
                if route.is_none() {
                    route = Some(target);
                }
            }
            None => gateway_calls.push(call),
        }
    }
    (gateway_calls, route)
}
