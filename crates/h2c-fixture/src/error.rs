//! Error types for the fixture endpoint

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Fixture errors, rendered as plain-text HTTP responses
#[derive(Debug, Error)]
pub enum FixtureError {
    /// `size` is not an integer
    #[error("Invalid size parameter: {0:?}")]
    InvalidSize(String),

    /// `size` exceeds the configured maximum
    #[error("Size {size} exceeds the maximum of {max}")]
    SizeTooLarge {
        /// Requested filler size
        size: i64,
        /// Configured maximum
        max: u64,
    },

    /// The request body could not be read
    #[error("Failed to read request body: {0}")]
    Body(#[from] axum::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// TLS material could not be generated or loaded
    #[error("TLS error: {0}")]
    Tls(String),

    /// I/O errors from the listener
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for fixture operations
pub type FixtureResult<T> = Result<T, FixtureError>;

impl IntoResponse for FixtureError {
    fn into_response(self) -> Response {
        let status = match &self {
            FixtureError::InvalidSize(_)
            | FixtureError::SizeTooLarge { .. }
            | FixtureError::Body(_) => StatusCode::BAD_REQUEST,
            FixtureError::Configuration(_) | FixtureError::Tls(_) | FixtureError::Io(_) => {
                tracing::error!(error = %self, "Internal fixture error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, format!("{}\n", self)).into_response()
    }
}
