// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # ACA Host Agent CLI
//!
//! The `aca` binary runs the host network control agent and doubles as a
//! small controller stand-in for pushing goal states at it.
//!
//! ## Commands
//!
//! - `aca [run]` - Serve goal states (dry-run unless `-e` is given)
//! - `aca push` - Send a goal state to a running agent
//! - `aca config show|validate|generate` - Configuration management

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use aca_agent::commands::{self, ConfigCommand, PushArgs};
use aca_agent::settings::{self, CliOverrides};
use aca_core::domain::agent_config::{LogFormat, TransportProtocol};

/// ACA host agent - apply network goal states pushed by the controller
#[derive(Parser)]
#[command(name = "aca")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Apply goal states to the host instead of logging planned changes
    #[arg(short = 'e', long = "execute", global = true)]
    execute: bool,

    /// Address to bind (run) or agent to reach (push)
    #[arg(short = 's', long = "server", global = true, value_name = "ADDRESS")]
    server: Option<String>,

    /// Transport protocol (udp, tcp)
    #[arg(short = 'p', long = "protocol", global = true, value_name = "PROTOCOL")]
    protocol: Option<TransportProtocol>,

    /// Transport port
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Path to configuration file (overrides discovery)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            execute: self.execute,
            server: self.server.clone(),
            protocol: self.protocol,
            port: self.port,
            log_level: self.log_level.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent (default)
    #[command(name = "run")]
    Run,

    /// Push a goal state to a running agent
    #[command(name = "push")]
    Push(PushArgs),

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let overrides = cli.overrides();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let config = settings::resolve(cli.config, &overrides)?;
            let observability = &config.spec.observability;
            init_logging(&observability.log_level, observability.log_format)?;

            let shutdown = commands::run::execute(config).await?;
            std::process::exit(shutdown.exit_code());
        }
        Commands::Push(args) => {
            let config = settings::resolve(cli.config, &overrides)?;
            let observability = &config.spec.observability;
            init_logging(&observability.log_level, observability.log_format)?;

            let response = commands::push::execute(args, &config.spec.transport).await?;
            if response.failure_count() > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Config { command } => {
            init_logging(overrides.log_level.as_deref().unwrap_or("warn"), LogFormat::Compact)?;
            commands::config::handle_command(command, cli.config, &overrides).await
        }
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    match format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}
