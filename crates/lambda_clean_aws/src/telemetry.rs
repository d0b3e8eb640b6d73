use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines for the CLI.
    Compact,
    /// One JSON object per event, for CloudWatch.
    Json,
}

/// Installs the global subscriber. `RUST_LOG` overrides `default_directive`.
/// Logs go to stderr; stdout carries the report.
pub fn init_tracing(format: LogFormat, default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Compact => builder.with_target(false).compact().init(),
        LogFormat::Json => builder.json().init(),
    }
}
