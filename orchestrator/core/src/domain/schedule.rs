// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};

use crate::domain::resource::{Input, Resource, ResourceError, ResourceType, ResourceValue};

/// Cron trigger for a workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub id: String,
    pub workflow_id: String,
    pub cron: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Input>,
}

fn default_enabled() -> bool {
    true
}

impl ScheduleConfig {
    pub fn new(
        id: impl Into<String>,
        workflow_id: impl Into<String>,
        cron: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            workflow_id: workflow_id.into(),
            cron: cron.into(),
            timezone: None,
            enabled: true,
            input: None,
        }
    }
}

impl Resource for ScheduleConfig {
    const KIND: ResourceType = ResourceType::Schedule;

    fn resource_id(&self) -> String {
        self.id.trim().to_string()
    }

    fn validate(&self) -> Result<(), ResourceError> {
        if self.workflow_id.trim().is_empty() {
            return Err(ResourceError::MissingField("workflow_id".to_string()));
        }
        let cron = self.cron.trim();
        if cron.is_empty() {
            return Err(ResourceError::MissingField("cron".to_string()));
        }
        // Five or six fields, or a descriptor such as @hourly.
        let fields = cron.split_whitespace().count();
        if !cron.starts_with('@') && !(5..=6).contains(&fields) {
            return Err(ResourceError::invalid(
                "cron",
                format!("expected 5 or 6 fields, got {}", fields),
            ));
        }
        Ok(())
    }

    fn into_value(self) -> ResourceValue {
        ResourceValue::Schedule(self)
    }

    fn from_value(value: ResourceValue) -> Option<Self> {
        match value {
            ResourceValue::Schedule(config) => Some(config),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cron_shape() {
        assert!(ScheduleConfig::new("nightly", "report", "0 2 * * *").validate().is_ok());
        assert!(ScheduleConfig::new("hourly", "report", "@hourly").validate().is_ok());
        assert!(ScheduleConfig::new("bad", "report", "every day").validate().is_err());
        assert!(ScheduleConfig::new("bad", "", "0 2 * * *").validate().is_err());
    }
}
