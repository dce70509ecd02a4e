use axum::{extract::State, Json};
use serde::Serialize;
use super::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub rpc: String,
    pub chain_id: Option<u64>,
    pub expected_chain_id: u64,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    // RPC reachability doubles as the network check
    let chain_id = state.lottery.chain_id().await.ok();
    let rpc_status = if chain_id.is_some() {
        "connected".to_string()
    } else {
        "disconnected".to_string()
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        rpc: rpc_status,
        chain_id,
        expected_chain_id: state.config.chain_id,
    })
}

pub async fn welcome() -> &'static str {
    "Welcome to the lottery relay"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::services::contract::mock::MockLottery;
    use std::sync::Arc;

    #[tokio::test]
    async fn health_reports_chain_id() {
        let state = AppState {
            lottery: Arc::new(MockLottery::new(0)),
            config: test_config(),
        };
        let Json(health) = health_check(State(state)).await;
        assert_eq!(health.rpc, "connected");
        assert_eq!(health.chain_id, Some(health.expected_chain_id));
    }

    #[tokio::test]
    async fn health_reports_unreachable_rpc() {
        let mock = MockLottery::new(0);
        mock.fail_rpc("chain_id", "connection refused");
        let state = AppState {
            lottery: Arc::new(mock),
            config: test_config(),
        };
        let Json(health) = health_check(State(state)).await;
        assert_eq!(health.rpc, "disconnected");
        assert!(health.chain_id.is_none());
    }
}
