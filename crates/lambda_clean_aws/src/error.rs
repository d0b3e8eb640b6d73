use lambda_clean_core::{ConfigError, SweepError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CleanError {
    #[error("invalid prune request: {0}")]
    InvalidEvent(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sweep(#[from] SweepError),
}
