//! CLI module for mcpflow - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for gateway health, the
//! tool catalog, one-off invocations and full workflow runs.

pub mod commands;

pub use commands::Cli;
