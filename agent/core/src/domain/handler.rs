// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Object Handler Contract
//!
//! Every network-object type is applied by one [`ObjectHandler`]. Handlers
//! receive a borrowed configuration, return an [`OperationOutcome`] and never
//! keep a reference to the request afterwards.
//!
//! ## Operation semantics
//!
//! | Operation | Object absent | Object present, same config | Object present, different config |
//! |-----------|---------------|-----------------------------|----------------------------------|
//! | create | provision | SUCCESS, no-op | reconfigure |
//! | update | provision | SUCCESS, no-op | reconfigure |
//! | delete | SUCCESS | remove | remove |
//!
//! Failures are reported inside the outcome, never as a `Result`, so one
//! entry cannot abort the rest of a batch.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Handler trait and per-entry error taxonomy

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::goal_state::{ObjectConfiguration, ObjectType, OperationOutcome};
use crate::domain::virtual_network::BackendError;

/// Shared handle stored in the dispatch registry
pub type HandlerRef = Arc<dyn ObjectHandler>;

#[async_trait]
pub trait ObjectHandler: Send + Sync {
    /// Tag this handler is registered under
    fn object_type(&self) -> ObjectType;

    async fn apply_create(&self, configuration: &ObjectConfiguration) -> OperationOutcome;

    async fn apply_update(&self, configuration: &ObjectConfiguration) -> OperationOutcome;

    async fn apply_delete(&self, object_id: &str) -> OperationOutcome;
}

/// Registry miss for an entry's object type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("unsupported object type")]
    NotFound(ObjectType),
}

/// Failure raised while or after touching host state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("apply failed: {0}")]
    Failed(String),

    #[error("apply failed, partial state may remain: {0}")]
    PartialState(String),

    #[error("operation timed out")]
    TimedOut,

    #[error("configuration does not match {expected} handler")]
    WrongObjectType { expected: ObjectType },
}

impl ApplyError {
    /// Whether the host may hold a half-applied change for this object
    pub fn may_leave_partial_state(&self) -> bool {
        matches!(self, ApplyError::PartialState(_) | ApplyError::TimedOut)
    }
}

impl From<BackendError> for ApplyError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::PartiallyApplied(msg) => ApplyError::PartialState(msg),
            other => ApplyError::Failed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_error_detail() {
        let err = DispatchError::NotFound(ObjectType::Unrecognized);
        assert_eq!(err.to_string(), "unsupported object type");
    }

    #[test]
    fn test_backend_error_mapping() {
        let partial: ApplyError = BackendError::PartiallyApplied("bridge created, route missing".into()).into();
        assert!(partial.may_leave_partial_state());
        assert_eq!(
            partial.to_string(),
            "apply failed, partial state may remain: bridge created, route missing"
        );

        let rejected: ApplyError = BackendError::Rejected("cidr overlaps".into()).into();
        assert!(!rejected.may_leave_partial_state());
        assert_eq!(rejected.to_string(), "apply failed: backend rejected change: cidr overlaps");
    }

    #[test]
    fn test_timeout_detail() {
        assert_eq!(ApplyError::TimedOut.to_string(), "operation timed out");
    }
}
