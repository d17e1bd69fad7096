//! `voxlog serve` — Start the HTTP gateway.

use tracing::{error, info};
use voxlog_config::AppConfig;

pub async fn run(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load()?;

    if let Some(port) = port {
        config.gateway.port = port;
    }

    let missing = config.missing_keys();
    if !missing.is_empty() {
        error!(keys = %missing.join(", "), "Missing required API keys");
        return Err(format!(
            "missing required API keys: {} — set them before starting the gateway",
            missing.join(", ")
        )
        .into());
    }

    info!(
        host = %config.gateway.host,
        port = config.gateway.port,
        chat_provider = %config.chat.provider,
        "Starting voxlog gateway"
    );

    voxlog_gateway::start(config).await
}
