//! AWS-backed adapters and entry points for the version sweep.
//!
//! This crate owns runtime integration details (SDK clients, configuration
//! loading, the CLI and the scheduled Lambda handler). The sweep itself lives
//! in `lambda_clean_core`.

pub mod adapters;
pub mod cli;
pub mod error;
pub mod handlers;
pub mod telemetry;
