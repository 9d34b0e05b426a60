// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain Layer
//!
//! Pure types and ports. Nothing here opens sockets or spawns tasks.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Goal state aggregate, handler trait, agent configuration

pub mod agent_config;
pub mod goal_state;
pub mod handler;
pub mod virtual_network;
