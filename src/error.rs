// src/error.rs

//! Unified error handling for the sync application.

use std::fmt;

use thiserror::Error;

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// GraphQL response carried an `errors` field
    #[error("GraphQL error in {operation}: {message}")]
    GraphQl { operation: String, message: String },

    /// Response was well-formed JSON but not the expected shape
    #[error("Unexpected response from {context}: {message}")]
    UnexpectedResponse { context: String, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a GraphQL error for the named operation.
    pub fn graphql(operation: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::GraphQl {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Create an unexpected-response error with context.
    pub fn unexpected(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::UnexpectedResponse {
            context: context.into(),
            message: message.to_string(),
        }
    }
}
