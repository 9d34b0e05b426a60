// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Build Script for aca-agent-core
//!
//! Compiles the goal state Protocol Buffer schema exchanged with the network
//! controller.
//!
//! # Compilation Targets
//!
//! - **Goal State**: `GoalState`, `ObjectState`, per-type configurations and the
//!   `AgentReply` envelope returned to the controller
//!
//! # Code Generation
//!
//! Uses `prost-build` to generate Rust message types from `goalstate.proto`,
//! looked up in `proto-vendor/` (published packages, created by CI) and then in
//! the workspace `../../proto/` directory.
//!
//! Generated code is placed in `OUT_DIR` and included in
//! `src/infrastructure/wire.rs`.
//!
//! # Dependencies
//!
//! - **protoc**: Protocol buffer compiler (vendored via `protoc-bin-vendored`)
//! - **prost-build**: Code generator for Rust message types

use std::path::Path;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set PROTOC environment variable to point to the vendored protoc binary
    let protoc = protoc_bin_vendored::protoc_bin_path()
        .map_err(|e| format!("vendored protoc unavailable: {e:?}"))?;
    std::env::set_var("PROTOC", protoc);

    let proto_root = ["proto-vendor", "../../proto"]
        .into_iter()
        .find(|dir| Path::new(dir).join("goalstate.proto").exists())
        .ok_or("goalstate.proto not found in proto-vendor/ or ../../proto/")?;

    let schema = format!("{proto_root}/goalstate.proto");

    prost_build::Config::new().compile_protos(&[schema.as_str()], &[proto_root])?;

    println!("cargo:rerun-if-changed={schema}");

    Ok(())
}
