use thiserror::Error;

use crate::model::{FunctionName, VersionId};

/// Failure reported by a [`crate::provider::ResourceProvider`] call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProviderError {
    message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Rejected configuration; raised before any sweep work starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("concurrency must be a positive integer")]
    ZeroConcurrency,
    #[error("concurrency {requested} exceeds the limit of {limit} workers")]
    ConcurrencyAboveLimit { requested: usize, limit: usize },
    #[error("stack name cannot be empty")]
    EmptyGroup,
    #[error("max_stack_depth must be a positive integer")]
    ZeroGroupDepth,
    #[error("failed to load configuration: {0}")]
    Environment(String),
}

/// Fatal sweep failure. Cancellation is never represented here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SweepError {
    #[error("failed to list functions: {source}")]
    ListFunctions { source: ProviderError },
    #[error("failed to list resources for stack {group}: {source}")]
    ListGroupMembers { group: String, source: ProviderError },
    #[error("stack {group} is nested deeper than {limit} levels")]
    GroupDepthExceeded { group: String, limit: usize },
    #[error("failed to list versions of {function}: {source}")]
    ListVersions {
        function: FunctionName,
        source: ProviderError,
    },
    #[error("failed to delete {function}:{version}: {source}")]
    Delete {
        function: FunctionName,
        version: VersionId,
        source: ProviderError,
    },
    #[error("delete executor stopped before finishing {function}:{version}")]
    ExecutorLost {
        function: FunctionName,
        version: VersionId,
    },
    #[error("worker pool halted before {function} finished")]
    PoolHalted { function: FunctionName },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_error_names_the_qualified_version() {
        let error = SweepError::Delete {
            function: FunctionName::new("svc-a"),
            version: VersionId::published("3").expect("published version"),
            source: ProviderError::new("AccessDenied"),
        };

        assert_eq!(error.to_string(), "failed to delete svc-a:3: AccessDenied");
    }

    #[test]
    fn depth_error_names_the_offending_stack() {
        let error = SweepError::GroupDepthExceeded {
            group: "nested-7".to_string(),
            limit: 6,
        };

        assert_eq!(
            error.to_string(),
            "stack nested-7 is nested deeper than 6 levels"
        );
    }
}
