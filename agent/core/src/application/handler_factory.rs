// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Handler Factory - Application Layer
//!
//! Creates the host backends and object handlers selected by the execution
//! mode and assembles them into a [`DispatchRegistry`].
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Wire infrastructure backends into domain handler ports

use std::sync::Arc;

use crate::application::registry::DispatchRegistry;
use crate::application::virtual_network_handler::VirtualNetworkHandler;
use crate::domain::agent_config::{ExecutionConfig, ExecutionMode};
use crate::domain::virtual_network::VirtualNetworkBackend;
use crate::infrastructure::backends::{DryRunVirtualNetworkBackend, InMemoryVirtualNetworkBackend};

/// Creates a VirtualNetworkBackend implementation based on the execution mode
pub fn create_virtual_network_backend(mode: &ExecutionMode) -> Arc<dyn VirtualNetworkBackend> {
    match mode {
        ExecutionMode::DryRun => Arc::new(DryRunVirtualNetworkBackend::new()),
        ExecutionMode::Execute => Arc::new(InMemoryVirtualNetworkBackend::new()),
    }
}

/// Builds the registry with one handler per supported object type
pub fn create_dispatch_registry(config: &ExecutionConfig) -> Arc<DispatchRegistry> {
    create_dispatch_registry_with(config, create_virtual_network_backend(&config.mode))
}

/// Same as [`create_dispatch_registry`] with a caller-provided backend
pub fn create_dispatch_registry_with(
    config: &ExecutionConfig,
    virtual_networks: Arc<dyn VirtualNetworkBackend>,
) -> Arc<DispatchRegistry> {
    DispatchRegistry::builder()
        .register(Arc::new(VirtualNetworkHandler::new(
            virtual_networks,
            config.backend_timeout(),
        )))
        .build()
}
