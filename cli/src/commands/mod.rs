// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the ACA CLI

pub mod config;
pub mod push;
pub mod run;

pub use self::config::ConfigCommand;
pub use self::push::PushArgs;
