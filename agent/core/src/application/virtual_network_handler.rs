// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Virtual Network Handler
//!
//! Applies CREATE/UPDATE/DELETE for virtual networks against a
//! [`VirtualNetworkBackend`]. Every operation is idempotent so the controller
//! can resend a goal state after a timeout without side effects:
//!
//! - create of an identical network is a no-op success
//! - create or update of a differing network reconfigures it in place
//! - update of a missing network provisions it
//! - delete of a missing network succeeds
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Object handler for `ObjectType::VirtualNetwork`

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::application::object_locks::ObjectLocks;
use crate::domain::goal_state::{ObjectConfiguration, ObjectType, OperationOutcome, OperationType};
use crate::domain::handler::{ApplyError, ObjectHandler};
use crate::domain::virtual_network::{
    BackendError, ValidationError, VirtualNetworkBackend, VirtualNetworkRecord,
};

pub struct VirtualNetworkHandler {
    backend: Arc<dyn VirtualNetworkBackend>,
    locks: ObjectLocks,
    timeout: Duration,
}

impl VirtualNetworkHandler {
    pub fn new(backend: Arc<dyn VirtualNetworkBackend>, timeout: Duration) -> Self {
        Self {
            backend,
            locks: ObjectLocks::new(),
            timeout,
        }
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, ApplyError>
    where
        F: Future<Output = Result<T, BackendError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(ApplyError::from),
            Err(_) => Err(ApplyError::TimedOut),
        }
    }

    /// Drive the backend to hold exactly `record`.
    async fn converge(&self, record: &VirtualNetworkRecord) -> Result<(), ApplyError> {
        match self.bounded(self.backend.find(&record.id)).await? {
            Some(existing) if existing == *record => {
                debug!(id = %record.id, "Virtual network already matches desired state");
                Ok(())
            }
            Some(_) => self.bounded(self.backend.reconfigure(record)).await,
            None => self.bounded(self.backend.provision(record)).await,
        }
    }

    async fn apply_desired(&self, operation: OperationType, configuration: &ObjectConfiguration) -> OperationOutcome {
        let config = match configuration {
            ObjectConfiguration::VirtualNetwork(config) => config,
            other => {
                let err = ApplyError::WrongObjectType {
                    expected: ObjectType::VirtualNetwork,
                };
                return OperationOutcome::failure(other.object_id(), err.to_string());
            }
        };

        let record = match VirtualNetworkRecord::from_configuration(config) {
            Ok(record) => record,
            Err(err) => {
                debug!(id = %config.id, %operation, error = %err, "Rejected virtual network configuration");
                return OperationOutcome::failure(config.id.clone(), err.to_string());
            }
        };

        let result = {
            let _guard = self.locks.acquire(&record.id).await;
            self.converge(&record).await
        };
        self.locks.release_idle(&record.id);

        match result {
            Ok(()) => OperationOutcome::success(record.id),
            Err(err) => {
                warn!(
                    id = %record.id,
                    %operation,
                    error = %err,
                    partial_state = err.may_leave_partial_state(),
                    "Failed to apply virtual network"
                );
                OperationOutcome::failure(record.id, err.to_string())
            }
        }
    }
}

#[async_trait]
impl ObjectHandler for VirtualNetworkHandler {
    fn object_type(&self) -> ObjectType {
        ObjectType::VirtualNetwork
    }

    async fn apply_create(&self, configuration: &ObjectConfiguration) -> OperationOutcome {
        self.apply_desired(OperationType::Create, configuration).await
    }

    async fn apply_update(&self, configuration: &ObjectConfiguration) -> OperationOutcome {
        self.apply_desired(OperationType::Update, configuration).await
    }

    async fn apply_delete(&self, object_id: &str) -> OperationOutcome {
        if object_id.trim().is_empty() {
            return OperationOutcome::failure(object_id, ValidationError::MissingObjectId.to_string());
        }

        let result = {
            let _guard = self.locks.acquire(object_id).await;
            self.bounded(self.backend.remove(object_id)).await
        };
        self.locks.release_idle(object_id);

        match result {
            Ok(removed) => {
                if !removed {
                    debug!(id = object_id, "Virtual network already absent");
                }
                OperationOutcome::success(object_id)
            }
            Err(err) => {
                warn!(id = object_id, error = %err, "Failed to delete virtual network");
                OperationOutcome::failure(object_id, err.to_string())
            }
        }
    }
}
