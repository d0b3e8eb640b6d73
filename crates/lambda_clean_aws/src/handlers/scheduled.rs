use std::sync::Arc;

use chrono::Utc;
use lambda_clean_core::report::BufferedReport;
use lambda_clean_core::{ResourceProvider, SweepConfig, SweepRequest, SweepSummary, Sweeper};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::CleanError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PruneResponse {
    pub status: String,
    pub summary: SweepSummary,
    /// Rendered report lines, in the order they were written.
    pub decisions: Vec<String>,
    pub finished_at: String,
}

/// Runs one sweep for a scheduled (EventBridge) or API Gateway invocation.
pub async fn handle_prune_event<P>(
    event: Value,
    provider: Arc<P>,
) -> Result<PruneResponse, CleanError>
where
    P: ResourceProvider + ?Sized + 'static,
{
    let request = decode_prune_event(event)?;
    let config = SweepConfig::try_from(request)?;
    info!(prefix = config.prefix(), stack = config.group(), "prune invocation accepted");

    let report = Arc::new(BufferedReport::echoing());
    let summary = Sweeper::new(provider, config, report.clone(), CancellationToken::new())
        .run()
        .await?;

    Ok(PruneResponse {
        status: "completed".to_string(),
        summary,
        decisions: report.rendered(),
        finished_at: Utc::now().to_rfc3339(),
    })
}

pub fn decode_prune_event(event: Value) -> Result<SweepRequest, CleanError> {
    let payload = unwrap_body(event).map_err(CleanError::InvalidEvent)?;
    serde_json::from_value(payload)
        .map_err(|error| CleanError::InvalidEvent(format!("Malformed request: {error}")))
}

fn unwrap_body(event: Value) -> Result<Value, String> {
    let Some(object) = event.as_object() else {
        return Err("Request payload must be a JSON object".to_string());
    };

    let Some(body) = object.get("body") else {
        return Ok(event);
    };

    match body {
        Value::Null => Ok(json!({})),
        Value::Object(_) => Ok(body.clone()),
        Value::String(text) => {
            serde_json::from_str(text).map_err(|error| format!("Malformed JSON body: {error}"))
        }
        _ => Err("Request body must be a JSON object".to_string()),
    }
}
