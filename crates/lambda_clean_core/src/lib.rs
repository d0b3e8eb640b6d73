//! Provider-agnostic retention sweep for published function versions.
//!
//! This crate owns discovery, version listing, retention classification,
//! bounded deletion dispatch and report rendering. It intentionally excludes
//! AWS SDK and Lambda runtime concerns; those live in `lambda_clean_aws`
//! behind the [`provider::ResourceProvider`] seam.

pub mod config;
pub mod discovery;
pub mod error;
pub mod model;
pub mod pagination;
pub mod provider;
pub mod report;
pub mod retention;
pub mod sweep;
pub mod versions;
pub mod worker_pool;

pub use config::{FailurePolicy, SweepConfig, SweepRequest};
pub use error::{ConfigError, ProviderError, SweepError};
pub use model::{FunctionName, Retention, RetentionDecision, VersionId};
pub use provider::ResourceProvider;
pub use sweep::{SweepSummary, Sweeper};
