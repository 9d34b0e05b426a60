// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Effective agent settings
//!
//! Precedence, lowest first: built-in defaults, discovered or explicit YAML
//! file, `ACA_*` environment variables, command-line flags.

use anyhow::{Context, Result};
use std::path::PathBuf;

use aca_core::domain::agent_config::{AgentConfigManifest, ExecutionMode, TransportProtocol};

/// Values given on the command line; `None` keeps the configured value
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub execute: bool,
    pub server: Option<String>,
    pub protocol: Option<TransportProtocol>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

impl CliOverrides {
    pub fn apply(&self, config: &mut AgentConfigManifest) {
        if self.execute {
            config.spec.execution.mode = ExecutionMode::Execute;
        }
        if let Some(server) = &self.server {
            config.spec.transport.server_address = server.clone();
        }
        if let Some(protocol) = self.protocol {
            config.spec.transport.protocol = protocol;
        }
        if let Some(port) = self.port {
            config.spec.transport.port = port;
        }
        if let Some(level) = &self.log_level {
            config.spec.observability.log_level = level.clone();
        }
    }
}

/// Load, override and validate the configuration the process will run with.
pub fn resolve(config_path: Option<PathBuf>, overrides: &CliOverrides) -> Result<AgentConfigManifest> {
    let mut config = AgentConfigManifest::load_or_default(config_path).context("Failed to load configuration")?;
    overrides.apply(&mut config);
    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "apiVersion: aca/v1\nkind: AgentConfig\nmetadata:\n  name: compute-9\nspec:\n  transport:\n    server_address: 10.0.0.9\n    port: 7000\n"
        )
        .unwrap();

        let overrides = CliOverrides {
            execute: true,
            server: Some("127.0.0.1".to_string()),
            protocol: Some(TransportProtocol::Tcp),
            ..CliOverrides::default()
        };
        let config = resolve(Some(file.path().to_path_buf()), &overrides).unwrap();

        assert_eq!(config.metadata.name, "compute-9");
        assert_eq!(config.spec.transport.server_address, "127.0.0.1");
        assert_eq!(config.spec.transport.port, 7000);
        assert_eq!(config.spec.transport.protocol, TransportProtocol::Tcp);
        assert_eq!(config.spec.execution.mode, ExecutionMode::Execute);
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "apiVersion: aca/v1\nkind: AgentConfig\nmetadata:\n  name: n\nspec: {{}}\n").unwrap();

        let overrides = CliOverrides {
            port: Some(0),
            ..CliOverrides::default()
        };
        assert!(resolve(Some(file.path().to_path_buf()), &overrides).is_err());
    }
}
