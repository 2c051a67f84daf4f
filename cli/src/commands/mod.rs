// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the AgentFlow CLI

pub mod config;
pub mod serve;
pub mod validate;

pub use self::config::ConfigCommand;
pub use self::serve::ServeArgs;
pub use self::validate::ValidateArgs;
