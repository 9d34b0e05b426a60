// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod backends;
pub mod transport;
pub mod wire;

pub use backends::{DryRunVirtualNetworkBackend, InMemoryVirtualNetworkBackend};
