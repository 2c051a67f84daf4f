// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Resource definitions, the dependency graph and the persistence contract.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure types and invariants; no I/O besides config file loading

pub mod agent;
pub mod config;
pub mod graph;
pub mod knowledge;
pub mod mcp;
pub mod memory;
pub mod model;
pub mod project;
pub mod repository;
pub mod resource;
pub mod schedule;
pub mod schema;
pub mod tool;
pub mod validation;
pub mod webhook;
pub mod workflow;
