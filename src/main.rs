use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lottery_relay::api;
use lottery_relay::config::Config;
use lottery_relay::services::{EthersLottery, LotteryContract};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lottery_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting lottery relay");

    let lottery = EthersLottery::connect(&config).await?;
    let connected = lottery.chain_id().await?;
    if connected != config.chain_id {
        tracing::warn!(
            "RPC reports chain {} but LOTTERY_CHAIN_ID is {}",
            connected,
            config.chain_id
        );
    }

    let app_state = api::AppState {
        lottery: Arc::new(lottery),
        config: config.clone(),
    };

    let app = api::build_router(app_state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
