// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Agent Configuration Types
//
// Defines the configuration schema for the host network control agent:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Transport settings (server address, port, UDP/TCP, payload limit)
// - Execution mode (dry-run vs. execute) and backend call timeout
// - Observability settings
//
// The manifest is loaded once at startup and passed by reference into the
// transport and manager constructors.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const API_VERSION: &str = "aca/v1";
pub const KIND: &str = "AgentConfig";

/// Largest payload that fits one UDP datagram over IPv4
pub const MAX_DATAGRAM_BYTES: usize = 65_507;

/// Top-level Kubernetes-style agent configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfigManifest {
    /// API version (must be "aca/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "AgentConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: AgentConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Host name of the agent instance
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfigSpec {
    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportProtocol {
    Udp,
    Tcp,
}

impl Default for TransportProtocol {
    fn default() -> Self {
        Self::Udp
    }
}

impl fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportProtocol::Udp => write!(f, "udp"),
            TransportProtocol::Tcp => write!(f, "tcp"),
        }
    }
}

impl FromStr for TransportProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "udp" => Ok(Self::Udp),
            "tcp" => Ok(Self::Tcp),
            other => Err(format!("unknown transport protocol '{}'. Supported: udp, tcp", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Address the agent binds to (server) or connects to (push client)
    #[serde(default = "default_server_address")]
    pub server_address: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub protocol: TransportProtocol,

    /// Requests larger than this are rejected before decoding
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,

    /// How long the push client waits for a reply
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
}

impl TransportConfig {
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            server_address: default_server_address(),
            port: default_port(),
            protocol: TransportProtocol::default(),
            max_payload_bytes: default_max_payload_bytes(),
            response_timeout_ms: default_response_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutionMode {
    /// Validate and log planned changes without touching host state
    DryRun,
    /// Apply changes to the host network state
    Execute,
}

impl Default for ExecutionMode {
    fn default() -> Self {
        Self::DryRun
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub mode: ExecutionMode,

    /// Upper bound for every single host backend call
    #[serde(default = "default_backend_timeout_ms")]
    pub backend_timeout_ms: u64,
}

impl ExecutionConfig {
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::default(),
            backend_timeout_ms: default_backend_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Default tracing filter when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

// Default value functions
fn default_server_address() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    50001
}

fn default_max_payload_bytes() -> usize {
    MAX_DATAGRAM_BYTES
}

fn default_response_timeout_ms() -> u64 {
    5000
}

fn default_backend_timeout_ms() -> u64 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

impl Default for AgentConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "aca-agent".to_string(),
                labels: None,
            },
            spec: AgentConfigSpec::default(),
        }
    }
}

impl AgentConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. ACA_CONFIG_PATH environment variable
    /// 2. ./aca-config.yaml (working directory)
    /// 3. ~/.aca/config.yaml (user home)
    /// 4. /etc/aca/config.yaml
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("ACA_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./aca-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".aca").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/aca/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        let mut config = if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            Self::from_yaml_file(config_path)?
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ACA_SERVER") {
            tracing::info!("Environment override: ACA_SERVER={}", val);
            self.spec.transport.server_address = val;
        }

        if let Ok(val) = std::env::var("ACA_PORT") {
            match val.parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: ACA_PORT={}", port);
                    self.spec.transport.port = port;
                }
                Err(_) => {
                    tracing::warn!("Invalid value for ACA_PORT: '{}'. Ignoring.", val);
                }
            }
        }

        if let Ok(val) = std::env::var("ACA_PROTOCOL") {
            match val.parse::<TransportProtocol>() {
                Ok(protocol) => {
                    tracing::info!("Environment override: ACA_PROTOCOL={}", protocol);
                    self.spec.transport.protocol = protocol;
                }
                Err(e) => {
                    tracing::warn!("Invalid value for ACA_PROTOCOL: {}. Ignoring.", e);
                }
            }
        }

        if let Ok(val) = std::env::var("ACA_LOG_LEVEL") {
            self.spec.observability.log_level = val;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let transport = &self.spec.transport;
        if transport.server_address.trim().is_empty() {
            anyhow::bail!("spec.transport.server_address cannot be empty");
        }

        if transport.port == 0 {
            anyhow::bail!("spec.transport.port must be between 1 and 65535");
        }

        if transport.max_payload_bytes == 0 {
            anyhow::bail!("spec.transport.max_payload_bytes must be greater than zero");
        }

        if transport.protocol == TransportProtocol::Udp && transport.max_payload_bytes > MAX_DATAGRAM_BYTES {
            anyhow::bail!(
                "spec.transport.max_payload_bytes ({}) exceeds the UDP datagram limit of {} bytes",
                transport.max_payload_bytes,
                MAX_DATAGRAM_BYTES
            );
        }

        if transport.response_timeout_ms == 0 {
            anyhow::bail!("spec.transport.response_timeout_ms must be greater than zero");
        }

        if self.spec.execution.backend_timeout_ms == 0 {
            anyhow::bail!("spec.execution.backend_timeout_ms must be greater than zero");
        }

        Ok(())
    }
}
