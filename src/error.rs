//! Error types for the plugin core.

use thiserror::Error;

/// Common error type for the plugin core.
#[derive(Error, Debug)]
pub enum PluginError {
    /// Database error.
    ///
    /// Carries the backend's own error text. Errors from sqlx are
    /// converted automatically.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error, or an operation on a connector that has no
    /// live connection.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded or is incomplete.
    #[error("configuration error: {0}")]
    Config(String),

    /// Rejected input (identifiers, empty filters, empty column lists).
    #[error("validation error: {0}")]
    Validation(String),

    /// The backend does not support the requested operation.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),
}

impl From<sqlx::Error> for PluginError {
    fn from(e: sqlx::Error) -> Self {
        PluginError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for PluginError {
    fn from(e: serde_json::Error) -> Self {
        PluginError::Config(format!("config parse error: {e}"))
    }
}

impl From<toml::de::Error> for PluginError {
    fn from(e: toml::de::Error) -> Self {
        PluginError::Config(format!("config parse error: {e}"))
    }
}

/// Result type alias for plugin operations.
pub type Result<T> = std::result::Result<T, PluginError>;
