//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - health: probe the gateway
//! - tools: list the gateway catalog
//! - invoke: call one tool directly
//! - run: drive a full agent conversation

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mcpflow - MCP gateway client and multi-agent tool dispatch
#[derive(Parser, Debug)]
#[command(name = "mcpflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute (defaults to health)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that the gateway is reachable and healthy
    Health,

    /// List tools the gateway exposes
    Tools {
        /// Print the raw catalog as JSON
        #[arg(long)]
        json: bool,
    },

    /// Invoke a single tool through the gateway
    Invoke {
        /// Tool name
        tool: String,

        /// Arguments as a JSON object (or a bare value for the first parameter)
        #[arg(short, long)]
        args: Option<String>,

        /// Deadline in milliseconds (defaults to gateway.default_deadline_ms)
        #[arg(short, long)]
        deadline_ms: Option<u64>,
    },

    /// Run the orchestrator/planner/coder workflow on a task
    Run {
        /// Task description
        task: String,

        /// Print the full conversation report as JSON
        #[arg(long)]
        json: bool,
    },
}
