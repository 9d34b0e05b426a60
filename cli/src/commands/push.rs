// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `aca push`: send one goal state to a running agent and print the outcomes.
//!
//! Without `--file` a single sample VPC is pushed, which is the quickest way to
//! check that an agent is reachable and applying changes.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use aca_core::domain::agent_config::TransportConfig;
use aca_core::domain::goal_state::{
    AgentReply, GoalState, GoalStateResponse, ObjectState, OperationType, VirtualNetworkConfiguration,
};
use aca_core::infrastructure::{transport, wire};

#[derive(Args, Debug)]
pub struct PushArgs {
    /// YAML goal state to send (default: one sample VPC)
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Operation for the sample VPC
    #[arg(long, value_enum, default_value = "create")]
    pub operation: SampleOperation,

    /// Revision stamped on the sample goal state
    #[arg(long, default_value_t = 1)]
    pub revision: u64,

    /// Print the response as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SampleOperation {
    Create,
    Update,
    Delete,
}

impl From<SampleOperation> for OperationType {
    fn from(op: SampleOperation) -> Self {
        match op {
            SampleOperation::Create => OperationType::Create,
            SampleOperation::Update => OperationType::Update,
            SampleOperation::Delete => OperationType::Delete,
        }
    }
}

/// On-disk goal state accepted by `--file`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalStateFile {
    #[serde(default)]
    pub revision: u64,

    #[serde(default)]
    pub virtual_networks: Vec<VirtualNetworkEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualNetworkEntry {
    pub operation: OperationType,
    #[serde(flatten)]
    pub configuration: VirtualNetworkConfiguration,
}

impl GoalStateFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read goal state file {:?}", path))?;
        serde_yaml::from_str(&content).with_context(|| format!("Failed to parse goal state file {:?}", path))
    }

    pub fn into_goal_state(self) -> GoalState {
        let entries = self
            .virtual_networks
            .into_iter()
            .map(|entry| ObjectState::virtual_network(entry.operation, entry.configuration))
            .collect();
        GoalState::new(self.revision, entries)
    }
}

/// The VPC pushed when no file is given
pub fn sample_goal_state(operation: OperationType, revision: u64) -> GoalState {
    GoalState::new(
        revision,
        vec![ObjectState::virtual_network(
            operation,
            VirtualNetworkConfiguration {
                project_id: "dbf72700-5106-4a7a-918f-a016853911f8".to_string(),
                id: "99d9d709-8478-4b46-9f3f-2206b1023fd3".to_string(),
                name: "SuperVpc".to_string(),
                cidr: "192.168.0.0/24".to_string(),
            },
        )],
    )
}

pub async fn execute(args: PushArgs, transport_config: &TransportConfig) -> Result<GoalStateResponse> {
    let goal_state = match &args.file {
        Some(path) => GoalStateFile::load(path)?.into_goal_state(),
        None => sample_goal_state(args.operation.into(), args.revision),
    };

    let mut client = transport::connect_client(transport_config).await.with_context(|| {
        format!(
            "Failed to reach agent at {}:{} over {}",
            transport_config.server_address, transport_config.port, transport_config.protocol
        )
    })?;

    tracing::debug!(revision = goal_state.revision, entries = goal_state.len(), "Pushing goal state");
    let reply = transport::request(
        client.as_mut(),
        wire::serialize_goal_state(&goal_state),
        transport_config.response_timeout(),
    )
    .await
    .context("Goal state push failed")?;

    let response = match wire::deserialize_reply(&reply).context("Agent sent an unreadable reply")? {
        AgentReply::Response(response) => response,
        AgentReply::Rejected { cause } => anyhow::bail!("Agent rejected goal state: {}", cause),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_response(&response);
    }

    Ok(response)
}

fn print_response(response: &GoalStateResponse) {
    println!("{}", format!("Goal state revision {}", response.revision).bold());
    for outcome in &response.outcomes {
        let id = if outcome.object_id().is_empty() {
            "(no id)"
        } else {
            outcome.object_id()
        };
        match outcome.error_detail() {
            None => println!("  {} {}", "✓".green(), id),
            Some(detail) => println!("  {} {}: {}", "✗".red(), id, detail),
        }
    }
    println!(
        "{} succeeded, {} failed",
        response.success_count(),
        response.failure_count()
    );
}
