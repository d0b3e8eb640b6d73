use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_NUM_TO_KEEP: usize = 2;
pub const DEFAULT_CONCURRENCY: usize = 5;
/// Upper bound on delete workers; also the capacity of the task queue.
pub const MAX_CONCURRENCY: usize = 1024;

/// What to do when listing or deleting the versions of one function fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the whole sweep on the first error.
    #[default]
    FailFast,
    /// Log the error, skip the rest of that function and continue.
    SkipFunction,
}

/// Sweep parameters as supplied by a caller, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepRequest {
    pub prefix: String,
    #[serde(default)]
    pub stack: Option<String>,
    #[serde(default = "default_num_to_keep")]
    pub num_to_keep: usize,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub continue_on_error: bool,
    /// Nesting limit for stack expansion; unlimited when absent.
    #[serde(default)]
    pub max_stack_depth: Option<usize>,
}

impl SweepRequest {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            stack: None,
            num_to_keep: DEFAULT_NUM_TO_KEEP,
            concurrency: DEFAULT_CONCURRENCY,
            dry_run: false,
            continue_on_error: false,
            max_stack_depth: None,
        }
    }
}

pub fn default_num_to_keep() -> usize {
    DEFAULT_NUM_TO_KEEP
}

pub fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

/// Validated, immutable sweep configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfig {
    prefix: String,
    group: Option<String>,
    keep: usize,
    concurrency: usize,
    dry_run: bool,
    failure_policy: FailurePolicy,
    max_group_depth: Option<usize>,
}

impl SweepConfig {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn keep(&self) -> usize {
        self.keep
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    pub fn max_group_depth(&self) -> Option<usize> {
        self.max_group_depth
    }
}

impl TryFrom<SweepRequest> for SweepConfig {
    type Error = ConfigError;

    fn try_from(request: SweepRequest) -> Result<Self, Self::Error> {
        if request.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }

        if request.concurrency > MAX_CONCURRENCY {
            return Err(ConfigError::ConcurrencyAboveLimit {
                requested: request.concurrency,
                limit: MAX_CONCURRENCY,
            });
        }

        if request.max_stack_depth == Some(0) {
            return Err(ConfigError::ZeroGroupDepth);
        }

        let group = match request.stack {
            Some(stack) if stack.trim().is_empty() => return Err(ConfigError::EmptyGroup),
            Some(stack) => Some(stack.trim().to_string()),
            None => None,
        };

        let failure_policy = if request.continue_on_error {
            FailurePolicy::SkipFunction
        } else {
            FailurePolicy::FailFast
        };

        Ok(Self {
            prefix: request.prefix,
            group,
            keep: request.num_to_keep,
            concurrency: request.concurrency,
            dry_run: request.dry_run,
            failure_policy,
            max_group_depth: request.max_stack_depth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_cli() {
        let request: SweepRequest =
            serde_json::from_str(r#"{"prefix":"svc-"}"#).expect("request should parse");
        assert_eq!(request, SweepRequest::new("svc-"));

        let config = SweepConfig::try_from(request).expect("request should pass");
        assert_eq!(config.keep(), 2);
        assert_eq!(config.concurrency(), 5);
        assert!(!config.dry_run());
        assert_eq!(config.failure_policy(), FailurePolicy::FailFast);
        assert_eq!(config.group(), None);
    }

    #[test]
    fn rejects_zero_concurrency() {
        let request = SweepRequest {
            concurrency: 0,
            ..SweepRequest::new("svc-")
        };
        assert_eq!(
            SweepConfig::try_from(request).expect_err("request should fail"),
            ConfigError::ZeroConcurrency
        );
    }

    #[test]
    fn rejects_blank_stack_and_trims_named_stack() {
        let blank = SweepRequest {
            stack: Some("  ".to_string()),
            ..SweepRequest::new("svc-")
        };
        assert_eq!(
            SweepConfig::try_from(blank).expect_err("request should fail"),
            ConfigError::EmptyGroup
        );

        let named = SweepRequest {
            stack: Some(" app-stack ".to_string()),
            continue_on_error: true,
            ..SweepRequest::new("svc-")
        };
        let config = SweepConfig::try_from(named).expect("request should pass");
        assert_eq!(config.group(), Some("app-stack"));
        assert_eq!(config.failure_policy(), FailurePolicy::SkipFunction);
    }

    #[test]
    fn rejects_concurrency_above_the_worker_limit() {
        let at_limit = SweepRequest {
            concurrency: MAX_CONCURRENCY,
            ..SweepRequest::new("svc-")
        };
        assert!(SweepConfig::try_from(at_limit).is_ok());

        let request = SweepRequest {
            concurrency: usize::MAX,
            ..SweepRequest::new("svc-")
        };
        assert_eq!(
            SweepConfig::try_from(request).expect_err("request should fail"),
            ConfigError::ConcurrencyAboveLimit {
                requested: usize::MAX,
                limit: MAX_CONCURRENCY,
            }
        );
    }

    #[test]
    fn stack_depth_is_unlimited_unless_requested() {
        let config =
            SweepConfig::try_from(SweepRequest::new("svc-")).expect("request should pass");
        assert_eq!(config.max_group_depth(), None);

        let limited: SweepRequest =
            serde_json::from_str(r#"{"prefix":"svc-","max_stack_depth":4}"#)
                .expect("request should parse");
        let config = SweepConfig::try_from(limited).expect("request should pass");
        assert_eq!(config.max_group_depth(), Some(4));

        let zero = SweepRequest {
            max_stack_depth: Some(0),
            ..SweepRequest::new("svc-")
        };
        assert_eq!(
            SweepConfig::try_from(zero).expect_err("request should fail"),
            ConfigError::ZeroGroupDepth
        );
    }

    #[test]
    fn huge_keep_is_valid() {
        let request = SweepRequest {
            num_to_keep: usize::MAX,
            ..SweepRequest::new("svc-")
        };
        assert_eq!(
            SweepConfig::try_from(request).expect("request should pass").keep(),
            usize::MAX
        );
    }

    #[test]
    fn keep_zero_is_valid() {
        let request = SweepRequest {
            num_to_keep: 0,
            ..SweepRequest::new("svc-")
        };
        assert_eq!(
            SweepConfig::try_from(request).expect("request should pass").keep(),
            0
        );
    }
}
