// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # ACA Agent Core
//!
//! Host-side network control agent. A central controller pushes versioned
//! goal states; the agent applies each entry to the host and reports one
//! outcome per entry.
//!
//! | Layer | Contents |
//! |-------|----------|
//! | [`domain`] | Goal state model, handler contract, validation, configuration manifest |
//! | [`application`] | Communication manager, dispatch registry, object handlers |
//! | [`infrastructure`] | Protobuf wire codec, host backends, UDP/TCP transports |
//! | [`presentation`] | Agent server receive loop |
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Library root shared by the `aca` binary and integration tests

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
