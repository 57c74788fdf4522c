//! Error types for the heartbeat server.
//!
//! [`ApiError`] can be converted into an Axum HTTP response via its
//! [`IntoResponse`] implementation. [`ConfigError`] and [`ServerError`]
//! cover startup.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors returned by HTTP handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, format!("not found: {msg}")),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Errors raised while loading server configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable held a value that could not be used.
    #[error("invalid {name}: {reason}")]
    Invalid {
        /// The variable name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The stream timing parameters were rejected.
    #[error("invalid stream timing: {source}")]
    Emitter {
        /// The underlying validation error.
        #[from]
        source: heartbeat_core::ConfigError,
    },
}

/// Errors that can occur when starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let response = ApiError::NotFound(String::from("/nope")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn config_error_message_names_variable() {
        let err = ConfigError::Invalid {
            name: "HEARTBEAT_PORT",
            reason: String::from("invalid digit found in string"),
        };
        assert_eq!(
            err.to_string(),
            "invalid HEARTBEAT_PORT: invalid digit found in string"
        );
    }
}
