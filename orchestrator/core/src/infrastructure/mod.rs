// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod inline_tools;
pub mod meta;
pub mod repositories;
pub mod resource_loader;
pub mod temporal_client;

pub use inline_tools::InlineToolManager;
pub use meta::write_meta;
pub use repositories::MemoryResourceStore;
pub use temporal_client::TemporalProbe;
