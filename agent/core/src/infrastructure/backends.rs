// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Host Network Backend Implementations
//!
//! Infrastructure implementations of the [`VirtualNetworkBackend`] port.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Hold and mutate host network state on behalf of handlers
//! - **Pattern:** Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! - **InMemoryVirtualNetworkBackend** - Sharded, thread-safe network table used
//!   in execute mode and in tests
//! - **DryRunVirtualNetworkBackend** - Logs the change it would make and keeps
//!   no state

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::virtual_network::{BackendError, VirtualNetworkBackend, VirtualNetworkRecord};

#[derive(Clone, Default)]
pub struct InMemoryVirtualNetworkBackend {
    networks: Arc<DashMap<String, VirtualNetworkRecord>>,
    provisions: Arc<AtomicU64>,
    reconfigurations: Arc<AtomicU64>,
}

impl InMemoryVirtualNetworkBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of one network
    pub fn get(&self, id: &str) -> Option<VirtualNetworkRecord> {
        self.networks.get(id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Number of networks programmed from scratch since start
    pub fn provision_count(&self) -> u64 {
        self.provisions.load(Ordering::Relaxed)
    }

    /// Number of in-place reprogrammings since start
    pub fn reconfigure_count(&self) -> u64 {
        self.reconfigurations.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl VirtualNetworkBackend for InMemoryVirtualNetworkBackend {
    async fn find(&self, id: &str) -> Result<Option<VirtualNetworkRecord>, BackendError> {
        Ok(self.get(id))
    }

    async fn provision(&self, record: &VirtualNetworkRecord) -> Result<(), BackendError> {
        if self.networks.contains_key(&record.id) {
            return Err(BackendError::Rejected(format!(
                "virtual network {} is already provisioned",
                record.id
            )));
        }
        self.networks.insert(record.id.clone(), record.clone());
        self.provisions.fetch_add(1, Ordering::Relaxed);
        info!(id = %record.id, cidr = %record.cidr, "Provisioned virtual network");
        Ok(())
    }

    async fn reconfigure(&self, record: &VirtualNetworkRecord) -> Result<(), BackendError> {
        match self.networks.get_mut(&record.id) {
            Some(mut existing) => {
                *existing = record.clone();
                self.reconfigurations.fetch_add(1, Ordering::Relaxed);
                info!(id = %record.id, cidr = %record.cidr, "Reconfigured virtual network");
                Ok(())
            }
            None => Err(BackendError::Rejected(format!(
                "virtual network {} is not provisioned",
                record.id
            ))),
        }
    }

    async fn remove(&self, id: &str) -> Result<bool, BackendError> {
        let removed = self.networks.remove(id).is_some();
        if removed {
            info!(id, "Removed virtual network");
        } else {
            debug!(id, "Virtual network already absent");
        }
        Ok(removed)
    }
}

/// Backend used when the agent runs without execute mode
#[derive(Debug, Clone, Default)]
pub struct DryRunVirtualNetworkBackend;

impl DryRunVirtualNetworkBackend {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl VirtualNetworkBackend for DryRunVirtualNetworkBackend {
    async fn find(&self, _id: &str) -> Result<Option<VirtualNetworkRecord>, BackendError> {
        Ok(None)
    }

    async fn provision(&self, record: &VirtualNetworkRecord) -> Result<(), BackendError> {
        info!(
            id = %record.id,
            project_id = %record.project_id,
            name = %record.name,
            cidr = %record.cidr,
            "[dry-run] would provision virtual network"
        );
        Ok(())
    }

    async fn reconfigure(&self, record: &VirtualNetworkRecord) -> Result<(), BackendError> {
        info!(id = %record.id, cidr = %record.cidr, "[dry-run] would reconfigure virtual network");
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<bool, BackendError> {
        info!(id, "[dry-run] would remove virtual network");
        Ok(false)
    }
}
