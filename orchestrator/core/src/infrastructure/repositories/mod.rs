// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Resource Store Implementations
//!
//! Infrastructure implementations of [`ResourceStore`](crate::domain::repository::ResourceStore).
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve registered resources
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! - **MemoryResourceStore** - Thread-safe HashMap-backed storage with a
//!   broadcast change feed, used in standalone mode and tests
//!
//! Redis-backed stores are supplied at engine start by a service provider and
//! are not implemented in this crate.

pub mod memory;

pub use memory::MemoryResourceStore;
