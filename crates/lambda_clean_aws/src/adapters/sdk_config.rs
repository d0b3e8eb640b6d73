use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::ProvideCredentials;
use lambda_clean_core::ConfigError;
use tracing::debug;

/// Throttled delete and list calls are retried with adaptive backoff.
pub const MAX_ATTEMPTS: u32 = 8;

/// Loads the shared SDK configuration and resolves credentials once, so
/// configuration problems surface before any sweep work starts.
pub async fn load_sdk_config(region: Option<&str>) -> Result<SdkConfig, ConfigError> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .retry_config(RetryConfig::adaptive().with_max_attempts(MAX_ATTEMPTS));
    if let Some(region) = region_override(region) {
        loader = loader.region(Region::new(region));
    }
    let config = loader.load().await;

    let Some(region) = config.region() else {
        return Err(ConfigError::Environment(
            "no AWS region configured; pass --region or set AWS_REGION".to_string(),
        ));
    };

    let credentials = config.credentials_provider().ok_or_else(|| {
        ConfigError::Environment("no AWS credentials provider configured".to_string())
    })?;
    credentials.provide_credentials().await.map_err(|error| {
        ConfigError::Environment(format!("failed to resolve AWS credentials: {error}"))
    })?;

    debug!(region = %region, "loaded AWS configuration");
    Ok(config)
}

fn region_override(region: Option<&str>) -> Option<String> {
    region
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
