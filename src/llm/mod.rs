//! LLM Client Layer - Anthropic API integration and tool-call parsing
//!
//! This module provides:
//! - Request/response types for LLM communication
//! - LlmClient trait for API abstraction
//! - AnthropicClient implementation
//! - Tool call parsing

pub mod anthropic;
pub mod client;
pub mod tool_parser;
pub mod types;

pub use anthropic::AnthropicClient;
pub use client::{LlmClient, MockLlmClient};
pub use tool_parser::{normalize_tool_input, parse_response};
pub use types::{CompletionRequest, CompletionResponse, StopReason, ToolCall, ToolDefinition, Usage};
