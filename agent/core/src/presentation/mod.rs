// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`aca-agent-core`)
//!
//! Network-facing loop that hands received payloads to the
//! [`crate::application::CommunicationManager`]. No dispatch logic lives here.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`agent_server`] | UDP / TCP | Receive, process, reply until shutdown |

pub mod agent_server;

pub use agent_server::AgentServer;
