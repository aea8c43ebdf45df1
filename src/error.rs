//! Error types for storyboard store operations

use thiserror::Error;

/// Errors that can occur during store operations
///
/// Absence of a record is never an error: reads return `Option` and deletes
/// return `bool`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Validation error: {}", errors.join(", "))]
    Validation { errors: Vec<String> },

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn validation(errors: Vec<String>) -> Self {
        Self::Validation { errors }
    }

    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::Duplicate(msg.into())
    }

    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    pub fn invalid_schema(msg: impl Into<String>) -> Self {
        Self::InvalidSchema(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Validation and duplicate failures are caused by the caller's input and
    /// map to client-error responses. Everything else is fatal for the request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Duplicate(_))
    }

    /// Accumulated validation messages, empty for every other kind
    pub fn validation_errors(&self) -> &[String] {
        match self {
            Self::Validation { errors } => errors,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
