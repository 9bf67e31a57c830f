// src/error.rs

//! Unified error handling for the publisher.

use std::fmt;

use thiserror::Error;

/// Result type alias for publisher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// AWS S3 error
    #[error("S3 error: {0}")]
    S3(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

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

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource does not exist in the storage it was looked up in
    #[error("Not found: {0}")]
    NotFound(String),

    /// Copy or folder creation in a target storage failed
    #[error("Transfer error for {path}: {message}")]
    Transfer { path: String, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a not-found error.
    pub fn not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound(identifier.into())
    }

    /// Create a transfer error with the destination path as context.
    pub fn transfer(path: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Transfer {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error came out of a storage write.
    pub fn is_transfer(&self) -> bool {
        matches!(self, Self::Transfer { .. })
    }
}
