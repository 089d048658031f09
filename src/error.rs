//! Error types for Quillchat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Quillchat operations
///
/// The ones raised during a chat exchange are [`ChatError::MissingCredential`],
/// [`ChatError::SendInProgress`] and [`ChatError::RequestFailed`].
/// The rest come from configuration, persistence and export.
#[derive(Error, Debug)]
pub enum ChatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// No API key has been configured
    #[error("No API key configured. Set one with `quillchat key set <KEY>` or /key")]
    MissingCredential,

    /// The chat endpoint could not be reached or answered with a non-success status
    #[error("{0}")]
    RequestFailed(String),

    /// A send was attempted while an earlier exchange is still outstanding
    #[error("A message is already being sent")]
    SendInProgress,

    /// Record store errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Export was requested for a conversation with no messages
    #[error("There is no conversation to export")]
    EmptyTranscript,

    /// A setting key or value was rejected
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    /// No stored chat matches the requested id
    #[error("Unknown chat: {0}")]
    UnknownChat(String),

    /// Attachment could not be loaded or addressed
    #[error("Attachment error: {0}")]
    Attachment(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Quillchat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
