//! Conversation state - the append-only turn log
//!
//! The runner owns the state and only ever appends. Turns are exposed as a
//! slice; there is no way to edit or remove one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ToolErrorKind;
use crate::id::generate_conversation_id;
use crate::llm::ToolCall;
use crate::tools::{ToolInvocation, ToolOutput, ToolResult};

use super::role::AgentRole;

/// One tool call and what came of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolExchange {
    /// The call as the LLM issued it
    pub call: ToolCall,
    /// Validated invocation; absent when the call never got past the adapter
    pub invocation: Option<ToolInvocation>,
    pub result: ToolResult,
    pub output: ToolOutput,
}

impl ToolExchange {
    pub fn failure_kind(&self) -> Option<ToolErrorKind> {
        match &self.output {
            ToolOutput::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// One entry in the conversation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub index: usize,
    pub role: AgentRole,
    /// LLM text for agent turns; empty for tool execution turns
    pub content: String,
    /// Gateway tool calls requested by an agent turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Explicit hand-off requested through a routing tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<AgentRole>,
    /// Role whose calls a tool execution turn ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issued_by: Option<AgentRole>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exchanges: Vec<ToolExchange>,
    pub at: DateTime<Utc>,
}

impl Turn {
    /// Create an agent turn
    pub fn agent(role: AgentRole, content: impl Into<String>, tool_calls: Vec<ToolCall>, route: Option<AgentRole>) -> Self {
        Self {
            index: 0,
            role,
            content: content.into(),
            tool_calls,
            route,
            issued_by: None,
            exchanges: Vec::new(),
            at: Utc::now(),
        }
    }

    /// Create a tool execution turn for calls issued by `issued_by`
    pub fn tool_execution(issued_by: AgentRole, exchanges: Vec<ToolExchange>) -> Self {
        Self {
            index: 0,
            role: AgentRole::ToolExecutor,
            content: String::new(),
            tool_calls: Vec::new(),
            route: None,
            issued_by: Some(issued_by),
            exchanges,
            at: Utc::now(),
        }
    }

    pub fn is_tool_execution(&self) -> bool {
        self.role == AgentRole::ToolExecutor
    }

    /// Every exchange in this turn failed
    pub fn all_failed(&self) -> bool {
        !self.exchanges.is_empty() && self.exchanges.iter().all(|e| e.output.is_failure())
    }

    /// The role this turn acted on behalf of
    pub fn acting_role(&self) -> AgentRole {
        self.issued_by.unwrap_or(self.role)
    }

    fn render(&self) -> String {
        if self.is_tool_execution() {
            return self
                .exchanges
                .iter()
                .map(|e| format!("tool ({}): {}", e.call.name, e.output.render()))
                .collect::<Vec<_>>()
                .join("\n");
        }

        let mut lines = Vec::new();
        if !self.content.is_empty() {
            lines.push(format!("{}: {}", self.role, self.content));
        }
        for call in &self.tool_calls {
            lines.push(format!("{} called {} with {}", self.role, call.name, call.input));
        }
        if let Some(target) = self.route {
            lines.push(format!("{} handed off to {}", self.role, target));
        }
        lines.join("\n")
    }
}

/// Raw user request plus the ordered turn log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    id: String,
    request: String,
    turns: Vec<Turn>,
    started_at: DateTime<Utc>,
}

impl ConversationState {
    /// Create a new conversation for a user request
    pub fn new(request: impl Into<String>) -> Self {
        Self {
            id: generate_conversation_id(),
            request: request.into(),
            turns: Vec::new(),
            started_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn request(&self) -> &str {
        &self.request
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append a turn, assigning its index
    pub fn append(&mut self, mut turn: Turn) -> &Turn {
        turn.index = self.turns.len();
        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }

    /// Latest plan: the last planner turn that issued no gateway tool calls
    pub fn plan(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == AgentRole::Planner && t.tool_calls.is_empty())
            .map(|t| t.content.as_str())
    }

    pub fn has_plan(&self) -> bool {
        self.plan().is_some()
    }

    /// Number of trailing tool turns, issued by the same role, in which every call failed
    pub fn consecutive_tool_failures(&self) -> usize {
        let Some(caller) = self.turns.last().map(Turn::acting_role) else {
            return 0;
        };

        let mut failures = 0;
        for turn in self.turns.iter().rev() {
            if turn.acting_role() != caller {
                break;
            }
            if turn.is_tool_execution() {
                if !turn.all_failed() {
                    break;
                }
                failures += 1;
            }
        }
        failures
    }

    /// Whole conversation as `role: content` lines, the way each agent sees it
    pub fn transcript(&self) -> String {
        let mut lines = vec![format!("user: {}", self.request)];
        lines.extend(self.turns.iter().map(Turn::render).filter(|l| !l.is_empty()));
        lines.join("\n")
    }
}
