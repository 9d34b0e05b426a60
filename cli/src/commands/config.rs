// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

use aca_core::domain::agent_config::AgentConfigManifest;

use crate::settings::{self, CliOverrides};

/// Commented sample written by `aca config generate`
pub const SAMPLE_CONFIG: &str = include_str!("../../templates/aca-config.yaml");

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show effective configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./aca-config.yaml)
        #[arg(short, long, default_value = "./aca-config.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub async fn handle_command(
    command: ConfigCommand,
    config_override: Option<PathBuf>,
    overrides: &CliOverrides,
) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, overrides, paths),
        ConfigCommand::Validate { file } => validate(file.or(config_override), overrides),
        ConfigCommand::Generate { output, force } => generate(&output, force),
    }
}

fn show(config_override: Option<PathBuf>, overrides: &CliOverrides, show_paths: bool) -> Result<()> {
    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        match &config_override {
            Some(path) => println!("  1. --config flag: {}", path.display()),
            None => println!("  1. --config flag: {}", "(not set)".dimmed()),
        }
        println!(
            "  2. ACA_CONFIG_PATH: {}",
            std::env::var("ACA_CONFIG_PATH")
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./aca-config.yaml");
        println!("  4. ~/.aca/config.yaml");
        println!("  5. /etc/aca/config.yaml");
        match AgentConfigManifest::discover_config() {
            Some(found) => println!("  Discovered: {}", found.display()),
            None => println!("  Discovered: {}", "(none, using defaults)".dimmed()),
        }
        println!();
    }

    let config = settings::resolve(config_override, overrides)?;

    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Agent:".bold());
    println!("  Name: {}", config.metadata.name);
    if let Some(labels) = &config.metadata.labels {
        let mut labels: Vec<_> = labels.iter().collect();
        labels.sort();
        for (key, value) in labels {
            println!("  Label: {}={}", key, value);
        }
    }
    println!();

    let transport = &config.spec.transport;
    println!("{}", "Transport:".bold());
    println!("  Address: {}:{}", transport.server_address, transport.port);
    println!("  Protocol: {}", transport.protocol);
    println!("  Max payload: {} bytes", transport.max_payload_bytes);
    println!("  Response timeout: {} ms", transport.response_timeout_ms);
    println!();

    println!("{}", "Execution:".bold());
    println!("  Mode: {:?}", config.spec.execution.mode);
    println!("  Backend timeout: {} ms", config.spec.execution.backend_timeout_ms);
    println!();

    println!("{}", "Observability:".bold());
    println!("  Log level: {}", config.spec.observability.log_level);
    println!("  Log format: {:?}", config.spec.observability.log_format);

    Ok(())
}

fn validate(config_path: Option<PathBuf>, overrides: &CliOverrides) -> Result<()> {
    println!("Validating configuration...");

    settings::resolve(config_path, overrides)?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

fn generate(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", output.display());
    }

    std::fs::write(output, SAMPLE_CONFIG)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}
