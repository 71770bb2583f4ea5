//! Error types for Bareplug
//!
//! This module defines all error types used throughout the crate.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use thiserror::Error;

/// The primary error type for Bareplug operations.
#[derive(Error, Debug)]
pub enum BareplugError {
    /// Configuration-related errors (unreadable config, invalid values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Script errors (compile failures, runtime errors, unresolved imports, etc.)
    #[error("Script error: {0}")]
    Script(String),

    /// A file looked like a plugin but its declarations are unusable
    #[error("Invalid plugin: {0}")]
    InvalidPlugin(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized `Result` type for Bareplug operations.
pub type Result<T> = std::result::Result<T, BareplugError>;
