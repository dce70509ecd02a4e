// src/api/mod.rs

pub mod health;
pub mod lottery;

use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::LotteryContract;

#[derive(Clone)]
pub struct AppState {
    pub lottery: Arc<dyn LotteryContract>,
    pub config: Config,
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_from_config(&state.config);

    Router::new()
        .route("/", get(health::welcome))
        .route("/health", get(health::health_check))
        // Contract reads
        .route("/api/organizer", get(lottery::get_organizer))
        .route("/api/lotteryRound", get(lottery::get_lottery_round))
        .route(
            "/api/lotteryWinners/{round}",
            get(lottery::get_lottery_winner),
        )
        .route("/api/getParticipantsList", get(lottery::get_participants))
        .route("/api/getCollectedFunds", get(lottery::get_collected_funds))
        // Contract writes
        .route("/api/participate", post(lottery::participate))
        .route("/api/getLotteryResults", post(lottery::get_lottery_results))
        .route("/api/setNewOrganizer", post(lottery::set_new_organizer))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
