// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Application Layer (`agentflow-core`)
//!
//! Use cases that sit between the embedding engine and the domain.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`register_resource`] | Identity check, validation and create-only persistence |
//! | [`registry`] | In-process resource collections and pending seeds |
//! | [`reference_validation`] | Dependency graph, missing/unused references, cycle check |

pub mod reference_validation;
pub mod register_resource;
pub mod registry;

pub use reference_validation::{workflow_order, ExternalResources, ReferenceValidator};
pub use register_resource::{RegistrationError, ResourceRegistrar};
pub use registry::{PendingRegistration, ResourceRegistry};
