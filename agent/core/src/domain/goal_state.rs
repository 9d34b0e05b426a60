// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Goal State Model
//!
//! Typed view of a goal state batch pushed by the network controller, and of
//! the per-entry outcomes the agent reports back.
//!
//! | Type | Role |
//! |------|------|
//! | [`GoalState`] | One inbound batch, built per request and dropped after the reply |
//! | [`ObjectState`] | One entry: requested operation + tagged configuration |
//! | [`ObjectConfiguration`] | Closed union over object types, plus `Unrecognized` |
//! | [`GoalStateResponse`] | Outcomes in the same order as the request entries |
//! | [`AgentReply`] | What goes back on the wire: a response or a whole-request rejection |
//!
//! Adding an object type means adding an [`ObjectType`] tag, an
//! [`ObjectConfiguration`] arm and a handler registration. The communication
//! manager's control flow does not change.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Goal state aggregate and outcome value objects

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Schema marker every inbound goal state must carry.
pub const SUPPORTED_FORMAT_VERSION: u32 = 1;

/// Object-type tag used by the dispatch registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    VirtualNetwork,
    /// Entry whose configuration tag is not known to this agent build
    Unrecognized,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectType::VirtualNetwork => write!(f, "virtual_network"),
            ObjectType::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// Operation requested for one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationType {
    Create,
    Update,
    Delete,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationType::Create => write!(f, "CREATE"),
            OperationType::Update => write!(f, "UPDATE"),
            OperationType::Delete => write!(f, "DELETE"),
        }
    }
}

/// Why an entry's operation could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperationTypeError {
    #[error("missing operation type")]
    Missing,

    #[error("unsupported operation type")]
    Unsupported(i32),
}

/// Desired configuration of one virtual network (VPC)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualNetworkConfiguration {
    /// Opaque tenant identifier
    pub project_id: String,
    /// Idempotency key, stable across controller resends
    pub id: String,
    /// Display name, not unique
    pub name: String,
    /// IPv4/IPv6 prefix in CIDR notation
    pub cidr: String,
}

/// Closed union over the object types this agent understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectConfiguration {
    VirtualNetwork(VirtualNetworkConfiguration),
    Unrecognized,
}

impl ObjectConfiguration {
    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectConfiguration::VirtualNetwork(_) => ObjectType::VirtualNetwork,
            ObjectConfiguration::Unrecognized => ObjectType::Unrecognized,
        }
    }

    /// Identifier reported back in the outcome; empty for unrecognized entries.
    pub fn object_id(&self) -> &str {
        match self {
            ObjectConfiguration::VirtualNetwork(config) => &config.id,
            ObjectConfiguration::Unrecognized => "",
        }
    }
}

/// One entry of a goal state batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectState {
    /// Required; absent or unknown values fail this entry only
    pub operation: Result<OperationType, OperationTypeError>,
    pub configuration: ObjectConfiguration,
}

impl ObjectState {
    pub fn new(operation: OperationType, configuration: ObjectConfiguration) -> Self {
        Self {
            operation: Ok(operation),
            configuration,
        }
    }

    pub fn virtual_network(operation: OperationType, configuration: VirtualNetworkConfiguration) -> Self {
        Self::new(operation, ObjectConfiguration::VirtualNetwork(configuration))
    }

    pub fn object_id(&self) -> &str {
        self.configuration.object_id()
    }
}

/// A versioned batch of desired object configurations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalState {
    /// Controller-assigned revision, echoed in the response
    pub revision: u64,
    pub entries: Vec<ObjectState>,
}

impl GoalState {
    pub fn new(revision: u64, entries: Vec<ObjectState>) -> Self {
        Self { revision, entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutcomeStatus {
    Success,
    Failure,
}

/// Result of applying one entry
///
/// `error_detail` is present iff `status` is `Failure`; the constructors are
/// the only way to build one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationOutcome {
    object_id: String,
    status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_detail: Option<String>,
}

impl OperationOutcome {
    pub fn success(object_id: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            status: OutcomeStatus::Success,
            error_detail: None,
        }
    }

    pub fn failure(object_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            status: OutcomeStatus::Failure,
            error_detail: Some(detail.into()),
        }
    }

    pub fn object_id(&self) -> &str {
        &self.object_id
    }

    pub fn status(&self) -> OutcomeStatus {
        self.status
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.error_detail.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

/// Outcomes for one goal state, index-aligned with its entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalStateResponse {
    pub revision: u64,
    pub outcomes: Vec<OperationOutcome>,
}

impl GoalStateResponse {
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }
}

/// Message returned to the controller for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentReply {
    Response(GoalStateResponse),
    /// The payload could not be understood at all; no entries were processed
    Rejected { cause: String },
}
