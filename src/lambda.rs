use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::Deserialize;
use status_resolver::utils::logger;
use status_resolver::{ResolutionResult, StatusConfig, StatusEngine};
use std::sync::Arc;

const DEFAULT_CONFIG_PATH: &str = "status-config.toml";

#[derive(Debug, Default, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub bypass_cache: bool,
}

async fn function_handler(
    engine: &StatusEngine,
    event: LambdaEvent<Request>,
) -> Result<ResolutionResult, Error> {
    tracing::debug!("Status request {} (bypass_cache={})", event.context.request_id, event.payload.bypass_cache);
    Ok(engine.current_status(event.payload.bypass_cache).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_json_logger(false);

    // 引擎在冷啟動時建立一次，快取可以跨 warm invocation 沿用
    let config_path =
        std::env::var("STATUS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    tracing::info!("Loading configuration from {}", config_path);

    let config = StatusConfig::from_file(&config_path)?;
    let engine = Arc::new(StatusEngine::from_config(&config)?);

    run(service_fn(move |event: LambdaEvent<Request>| {
        let engine = Arc::clone(&engine);
        async move { function_handler(&engine, event).await }
    }))
    .await
}
