use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

mod cli;

use cli::Cli;
use cli::commands::Commands;
use mcpflow::Config;
use mcpflow::gateway::GatewayClient;
use mcpflow::llm::AnthropicClient;
use mcpflow::tools::{ToolOutput, ToolRegistry};
use mcpflow::workflow::{AgentRole, ConversationOutcome, ConversationRunner, RunnerConfig, cancel_pair};

fn setup_logging(level: &str) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mcpflow")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("mcpflow.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{} {}", "Gateway:".yellow(), config.gateway.base_url);
    }

    let client = GatewayClient::new(&config.gateway).context("Failed to create gateway client")?;

    match &cli.command {
        None | Some(Commands::Health) => handle_health_command(&client).await,
        Some(Commands::Tools { json }) => handle_tools_command(&client, *json).await,
        Some(Commands::Invoke { tool, args, deadline_ms }) => {
            let deadline = deadline_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.gateway.default_deadline());
            handle_invoke_command(&client, tool, args.as_deref(), deadline).await
        }
        Some(Commands::Run { task, json }) => handle_run_command(client, config, task, *json).await,
    }
}

async fn handle_health_command(client: &GatewayClient) -> Result<()> {
    if client.health().await? {
        println!("{} {}", "healthy".green(), client.base_url());
        Ok(())
    } else {
        println!("{} {}", "unhealthy".red(), client.base_url());
        Err(eyre!("Gateway at {} reported unhealthy", client.base_url()))
    }
}

async fn handle_tools_command(client: &GatewayClient, json: bool) -> Result<()> {
    let catalog = client.fetch_catalog().await?;

    if json {
        println!("{}", catalog.to_json()?);
        return Ok(());
    }

    println!("{} ({})", "Tools".green().bold(), catalog.len());
    for tool in catalog.all() {
        let required = tool.required();
        let params: Vec<String> = tool
            .parameters()
            .into_iter()
            .map(|p| if required.contains(&p) { format!("{}*", p) } else { p.to_string() })
            .collect();
        println!("  {} ({})", tool.name.cyan(), params.join(", "));
        if !tool.description.is_empty() {
            println!("      {}", tool.description.dimmed());
        }
    }
    Ok(())
}

async fn handle_invoke_command(client: &GatewayClient, tool: &str, args: Option<&str>, deadline: Duration) -> Result<()> {
    let registry = ToolRegistry::new();
    let snapshot = registry.sync(client).await?;
    let adapter = snapshot
        .adapter(tool)
        .ok_or_else(|| eyre!("Unknown tool: {}", tool))?;

    let raw_args = match args {
        Some(text) => serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string())),
        None => Value::Null,
    };

    let invocation = adapter.prepare(raw_args, deadline)?;
    info!("Invoking {} as {}", invocation.tool, invocation.invocation_id);

    let result = client.invoke(&invocation).await;
    match adapter.interpret(&result) {
        ToolOutput::Failed { kind, message } => {
            println!("{} {}: {}", "failed".red(), kind, message);
            Err(eyre!("Invocation {} failed: {}", invocation.invocation_id, kind))
        }
        ToolOutput::Text(text) => {
            println!("{}", text);
            Ok(())
        }
        ToolOutput::Structured(map) => {
            println!("{}", serde_json::to_string_pretty(&map)?);
            Ok(())
        }
    }
}

async fn handle_run_command(client: GatewayClient, config: &Config, task: &str, json: bool) -> Result<()> {
    let llm = Arc::new(AnthropicClient::new(&config.llm)?);
    let registry = Arc::new(ToolRegistry::new());
    let snapshot = registry.sync(&client).await?;
    println!("{} {} tools from {}", "Synced".green(), snapshot.len(), client.base_url());

    let runner = ConversationRunner::with_config(
        Arc::clone(&llm),
        Arc::new(client),
        Arc::clone(&registry),
        RunnerConfig::from_config(config),
    );

    let (handle, token) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });

    let report = runner.run_with_cancel(task, token).await;
    let usage = llm.total_usage();
    info!("Token usage: {} in, {} out", usage.input_tokens, usage.output_tokens);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for turn in report.state.turns() {
            let label = format!("[{}] {}", turn.index, turn.role);
            if turn.role == AgentRole::ToolExecutor {
                for exchange in &turn.exchanges {
                    let status = if exchange.output.is_failure() { "err".red() } else { "ok".green() };
                    println!("{} {} {}", label.dimmed(), exchange.call.name.cyan(), status);
                }
            } else if !turn.content.is_empty() {
                println!("{} {}", label.blue(), turn.content);
            }
        }
        println!("{} {} tokens", "Usage:".dimmed(), usage.total());
    }

    match report.outcome {
        ConversationOutcome::Completed { answer } => {
            println!("{}\n{}", "Completed".green().bold(), answer);
            Ok(())
        }
        ConversationOutcome::Failed {
            kind,
            message,
            abandoned,
        } => {
            println!("{} ({}): {}", "Failed".red().bold(), kind, message);
            if !abandoned.is_empty() {
                println!("  abandoned invocations: {}", abandoned.join(", "));
            }
            Err(eyre!("Conversation failed: {}", kind))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    let level = config.log_level.clone().unwrap_or_else(|| "info".to_string());
    setup_logging(&level).context("Failed to setup logging")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}
