//! Error types for the school-sms-rust library.
//!
//! This module provides custom error types using `thiserror` for better error
//! handling and more specific error messages throughout the application.

use thiserror::Error;

/// Errors that can occur in the school-sms-rust application.
#[derive(Error, Debug)]
pub enum SchoolSmsError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Connection pool errors
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// HTTP transport errors from the SMS gateway
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// User not found by username or id
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Password failed the minimum-length policy
    #[error("Password too short: must be at least {0} characters")]
    PasswordTooShort(usize),

    /// Password hashing errors
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// General error with context
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Result with SchoolSmsError
pub type Result<T> = std::result::Result<T, SchoolSmsError>;

impl From<anyhow::Error> for SchoolSmsError {
    fn from(err: anyhow::Error) -> Self {
        SchoolSmsError::Other(err.to_string())
    }
}
