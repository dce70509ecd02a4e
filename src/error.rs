use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BlockchainRpc(String),

    /// Revert reason decoded from a simulated contract call.
    #[error("execution reverted: {0}")]
    Revert(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Transaction dropped: {0}")]
    TransactionDropped(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Raw message used for revert classification and the relay envelope.
    pub fn raw_message(&self) -> String {
        match self {
            AppError::BlockchainRpc(msg) | AppError::BadRequest(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = self.raw_message();
        tracing::warn!("request failed: {}", message);

        // Client and server faults both surface as 400.
        (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
