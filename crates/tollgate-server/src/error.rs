//! Error types for the server.
//!
//! Every variant renders as a JSON body of the form `{"error": "..."}`.
//! Details stay in the logs; callers only see the fixed public message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Public message for any token exchange failure.
pub const TOKEN_EXCHANGE_FAILED: &str = "Failed retrieving token";

/// Server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The identity provider refused or garbled the code exchange.
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// Session credential unusable for the upstream call.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Method is not one the gateway forwards.
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Upstream did not answer in time.
    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    /// Upstream could not be reached or its body could not be read.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ServerError {
    fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self {
            ServerError::TokenExchange(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, TOKEN_EXCHANGE_FAILED)
            }
            ServerError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ServerError::MethodNotAllowed(_) => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
            }
            ServerError::UpstreamTimeout(_) => {
                (StatusCode::GATEWAY_TIMEOUT, "Upstream request timed out")
            }
            ServerError::Upstream(_) => (StatusCode::BAD_GATEWAY, "Upstream request failed"),
            ServerError::Config(_) | ServerError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        let detail = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status.as_u16(), error = %detail, "Server error");
        } else {
            tracing::warn!(status = %status.as_u16(), error = %detail, "Client error");
        }

        let body = ErrorResponse {
            error: message.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
