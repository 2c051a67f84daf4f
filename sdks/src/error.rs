// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use agentflow_core::application::RegistrationError;
use agentflow_core::domain::repository::StoreError;
use agentflow_core::domain::validation::ErrorList;

/// Errors returned by the engine surface.
///
/// `Clone` so that a failed stop can be cached and handed back to every later
/// `stop()` call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("engine configuration is unavailable")]
    ConfigUnavailable,

    #[error("engine already started")]
    AlreadyStarted,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error("load {kind} from {path}: {reason}")]
    Load {
        kind: &'static str,
        path: String,
        reason: String,
    },

    #[error("{context}: {source}")]
    Store { context: String, source: StoreError },

    #[error("bootstrap {mode} mode: {reason}")]
    Bootstrap { mode: &'static str, reason: String },

    #[error("{0}")]
    Lifecycle(String),

    /// Reference validation failed, or several failures were joined.
    #[error(transparent)]
    Aggregate(ErrorList),
}

impl EngineError {
    pub fn store(context: impl Into<String>, source: StoreError) -> Self {
        EngineError::Store {
            context: context.into(),
            source,
        }
    }

    /// `self` when `others` is empty, otherwise one aggregate listing `self`
    /// first.
    pub fn join(self, others: Vec<String>) -> Self {
        if others.is_empty() {
            return self;
        }
        let mut all = match self {
            EngineError::Aggregate(list) => list,
            other => ErrorList::single(other.to_string()),
        };
        for message in others {
            all.push(message);
        }
        EngineError::Aggregate(all)
    }

    /// `None` for an empty list, the single message as a lifecycle error, or
    /// an aggregate.
    pub fn from_messages(mut messages: Vec<String>) -> Option<Self> {
        match messages.len() {
            0 => None,
            1 => messages.pop().map(EngineError::Lifecycle),
            _ => Some(EngineError::Aggregate(ErrorList::new(messages))),
        }
    }

    pub fn is_already_started(&self) -> bool {
        matches!(self, EngineError::AlreadyStarted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_keeps_primary_first() {
        let err = EngineError::Lifecycle("bind listener on localhost:1: denied".into())
            .join(vec!["cleanup mode resources: redis: gone".into()]);
        assert_eq!(
            err.to_string(),
            "2 errors occurred:\n  1. bind listener on localhost:1: denied\n  \
             2. cleanup mode resources: redis: gone"
        );
    }

    #[test]
    fn test_join_without_others_is_identity() {
        let err = EngineError::ConfigUnavailable.join(Vec::new());
        assert!(matches!(err, EngineError::ConfigUnavailable));
    }

    #[test]
    fn test_from_messages() {
        assert!(EngineError::from_messages(Vec::new()).is_none());
        let closed = vec!["close resource store: store is closed".to_string()];
        let single = EngineError::from_messages(closed).unwrap();
        assert_eq!(single.to_string(), "close resource store: store is closed");
        let many = EngineError::from_messages(vec!["a".into(), "b".into()]).unwrap();
        assert!(many.to_string().starts_with("2 errors occurred:"));
    }
}
