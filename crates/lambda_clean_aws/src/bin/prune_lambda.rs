use std::sync::Arc;

use lambda_clean_aws::adapters::aws_provider::AwsResourceProvider;
use lambda_clean_aws::adapters::sdk_config::load_sdk_config;
use lambda_clean_aws::handlers::scheduled::{handle_prune_event, PruneResponse};
use lambda_clean_aws::telemetry::{init_tracing, LogFormat};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(event: LambdaEvent<Value>) -> Result<PruneResponse, Error> {
    let sdk_config = load_sdk_config(None)
        .await
        .map_err(|error| Error::from(error.to_string()))?;
    let provider = Arc::new(AwsResourceProvider::new(&sdk_config));

    handle_prune_event(event.payload, provider)
        .await
        .map_err(|error| Error::from(error.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing(LogFormat::Json, "info");
    lambda_runtime::run(service_fn(handle_request)).await
}
