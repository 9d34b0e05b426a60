// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod comm_manager;
pub mod handler_factory;
pub mod object_locks;
pub mod registry;
pub mod virtual_network_handler;

// Re-export for convenience
pub use comm_manager::{CommunicationManager, ManagerPhase};
pub use registry::{DispatchRegistry, DispatchRegistryBuilder};
pub use virtual_network_handler::VirtualNetworkHandler;
