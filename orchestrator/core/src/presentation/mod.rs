// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`agentflow-core`)
//!
//! HTTP surface served by the engine listener. Only liveness and readiness
//! are exposed; no business logic lives here.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | `/healthz` and `/readyz` |

pub mod api;

pub use api::health_router;
