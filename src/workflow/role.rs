//! Agent roles and their system prompts

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which participant is active in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Orchestrator,
    Planner,
    Coder,
    /// Not an LLM role; runs the tool calls the previous role issued
    ToolExecutor,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Orchestrator => "orchestrator",
            Self::Planner => "planner",
            Self::Coder => "coder",
            Self::ToolExecutor => "tool_executor",
        }
    }

    /// Whether this role is played by the LLM
    pub fn is_agent(&self) -> bool {
        !matches!(self, Self::ToolExecutor)
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::Orchestrator => ORCHESTRATOR_PROMPT,
            Self::Planner => PLANNER_PROMPT,
            Self::Coder => CODER_PROMPT,
            Self::ToolExecutor => "",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const ORCHESTRATOR_PROMPT: &str = "\
You are the orchestrator of a small team of coding agents.

Start by gathering context with the available tools: list directories, read \
key files such as the README, and check repository state. Call tools \
directly; do not describe tool calls in prose or code blocks.

Once you understand the task, call route_to_planner so the planner can \
propose approaches, or route_to_coder if a plan already exists.

When the coder reports back and the work is done, reply with a final \
summary for the user and no tool calls.";

const PLANNER_PROMPT: &str = "\
You are the planner. Using the context gathered so far, propose three \
distinct technical approaches to the task.

For each approach give the implementation steps, key considerations and \
likely pitfalls. Do not implement anything yourself.

When the plans are written, call route_to_coder.";

const CODER_PROMPT: &str = "\
You are the coder. Implement the plan you were given using the file and Git \
tools available to you.

Create a branch before changing anything, make the changes, run whatever \
checks are available and commit with a clear message. If a tool call fails, \
read the error, fix the cause and try again.

When the implementation is complete, call route_to_orchestrator with a short \
report of what changed.";
