// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use std::sync::Arc;
use tracing::warn;

use agentflow_core::application::{ExternalResources, ReferenceValidator};
use agentflow_core::domain::repository::ResourceStore;
use agentflow_core::domain::validation::ValidationReport;

use crate::engine::Engine;
use crate::error::EngineError;

impl Engine {
    /// Validates every reference across registered and store-resident
    /// resources. An invalid report comes back as one aggregate error listing
    /// each missing reference and cycle.
    pub async fn validate_references(&self) -> Result<ValidationReport, EngineError> {
        let report = self.reference_report().await?;
        for warning in &report.warnings {
            warn!(
                resource_type = %warning.resource_type,
                resource_id = %warning.resource_id,
                "{}", warning.message
            );
        }
        report.into_result().map_err(|errors| {
            metrics::counter!("agentflow_validation_failures_total").increment(1);
            EngineError::Aggregate(errors)
        })
    }

    /// Full report without turning failures into an error.
    pub async fn reference_report(&self) -> Result<ValidationReport, EngineError> {
        let store = self.resource_store();
        self.report_against(store.as_ref()).await
    }

    pub(crate) async fn report_against(
        &self,
        store: Option<&Arc<dyn ResourceStore>>,
    ) -> Result<ValidationReport, EngineError> {
        let project = self.state.read().registry.project_name();
        let external = match (store, project) {
            (Some(store), Some(project)) => ExternalResources::collect(store.as_ref(), &project)
                .await
                .map_err(|source| EngineError::store("list stored resources", source))?,
            _ => ExternalResources::new(),
        };

        let state = self.state.read();
        Ok(ReferenceValidator::new(&state.registry, &external).validate())
    }
}
