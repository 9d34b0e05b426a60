// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Virtual network validation and host-backend port.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Validated virtual network record and the backend contract
//!   implemented in `crate::infrastructure::backends`

use async_trait::async_trait;
use ipnet::IpNet;
use thiserror::Error;

use crate::domain::goal_state::VirtualNetworkConfiguration;

/// Rejection raised before any host state is touched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing project id")]
    MissingProjectId,

    #[error("missing object id")]
    MissingObjectId,

    #[error("invalid CIDR")]
    InvalidCidr { cidr: String },
}

/// A virtual network as programmed on the host
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualNetworkRecord {
    pub project_id: String,
    pub id: String,
    pub name: String,
    /// Network prefix with host bits cleared
    pub cidr: IpNet,
}

impl VirtualNetworkRecord {
    /// Validate a desired configuration into a record the backend can apply.
    pub fn from_configuration(config: &VirtualNetworkConfiguration) -> Result<Self, ValidationError> {
        if config.id.trim().is_empty() {
            return Err(ValidationError::MissingObjectId);
        }
        if config.project_id.trim().is_empty() {
            return Err(ValidationError::MissingProjectId);
        }
        let cidr = parse_cidr(&config.cidr)?;

        Ok(Self {
            project_id: config.project_id.clone(),
            id: config.id.clone(),
            name: config.name.clone(),
            cidr,
        })
    }
}

/// Parse an IPv4/IPv6 prefix; host bits are truncated ("10.0.0.7/8" is 10.0.0.0/8).
pub fn parse_cidr(raw: &str) -> Result<IpNet, ValidationError> {
    raw.trim()
        .parse::<IpNet>()
        .map(|net| net.trunc())
        .map_err(|_| ValidationError::InvalidCidr {
            cidr: raw.to_string(),
        })
}

/// Failure reported by a host networking backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("backend rejected change: {0}")]
    Rejected(String),

    /// The backend could not roll back a half-applied change
    #[error("change partially applied: {0}")]
    PartiallyApplied(String),
}

/// Host networking backend for virtual networks
///
/// Implementations own their concurrency discipline; handlers additionally
/// serialize calls per object id.
#[async_trait]
pub trait VirtualNetworkBackend: Send + Sync {
    /// Look up the currently programmed network
    async fn find(&self, id: &str) -> Result<Option<VirtualNetworkRecord>, BackendError>;

    /// Program a network that does not exist yet
    async fn provision(&self, record: &VirtualNetworkRecord) -> Result<(), BackendError>;

    /// Reprogram an existing network to match `record`
    async fn reconfigure(&self, record: &VirtualNetworkRecord) -> Result<(), BackendError>;

    /// Tear down a network; returns whether anything was removed
    async fn remove(&self, id: &str) -> Result<bool, BackendError>;
}
