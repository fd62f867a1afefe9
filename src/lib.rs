//! mcpflow - MCP gateway client and multi-agent tool dispatch
//!
//! Discovers tools hosted behind an MCP gateway, wraps each one in a
//! schema-validating adapter, invokes them over HTTP with deadlines and a
//! bounded retry, and drives an orchestrator/planner/coder conversation that
//! feeds tool results back to whichever role asked for them.

pub mod config;
pub mod error;
pub mod gateway;
pub mod id;
pub mod llm;
pub mod tools;
pub mod workflow;

pub use config::Config;
pub use error::{McpflowError, Result, ToolErrorKind};
