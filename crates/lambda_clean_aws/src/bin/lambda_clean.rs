use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use lambda_clean_aws::adapters::aws_provider::AwsResourceProvider;
use lambda_clean_aws::adapters::sdk_config::load_sdk_config;
use lambda_clean_aws::cli::{cancel_on_interrupt, Cli};
use lambda_clean_aws::error::CleanError;
use lambda_clean_aws::telemetry::{init_tracing, LogFormat};
use lambda_clean_core::report::StdoutReport;
use lambda_clean_core::{SweepConfig, SweepSummary, Sweeper};
use tokio_util::sync::CancellationToken;

async fn run(cli: Cli) -> Result<SweepSummary, CleanError> {
    let config = SweepConfig::try_from(cli.sweep_request())?;
    let sdk_config = load_sdk_config(cli.region.as_deref()).await?;
    let provider = Arc::new(AwsResourceProvider::new(&sdk_config));

    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());

    let summary = Sweeper::new(provider, config, Arc::new(StdoutReport), cancel)
        .run()
        .await?;
    Ok(summary)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(LogFormat::Compact, "warn");

    match run(cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
