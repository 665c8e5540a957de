//! Common error types for the artist/album backend

use thiserror::Error;

/// Common result type for artistalbum operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across artistalbum services
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write rejected because it would break a uniqueness rule
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the error is a database unique/primary-key constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }

    /// Map a unique-constraint violation to `Conflict`, leaving other errors untouched.
    ///
    /// Used where the store's constraint is the last word on uniqueness and a
    /// service-level pre-check may have been raced.
    pub fn unique_violation_as_conflict(self, message: impl Into<String>) -> Self {
        if self.is_unique_violation() {
            Error::Conflict(message.into())
        } else {
            self
        }
    }
}
