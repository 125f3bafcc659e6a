//! Custom error types for the common library
//!
//! This module defines the infrastructure error types shared by the
//! services: database access and object storage.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// SQLSTATE raised by Postgres on a unique constraint violation
pub const UNIQUE_VIOLATION: &str = "23505";

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("{0}")]
    Query(#[source] SqlxError),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    /// Returns true when the underlying query failed on a unique constraint
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DatabaseError::Query(SqlxError::Database(db)) => {
                db.code().as_deref() == Some(UNIQUE_VIOLATION)
            }
            _ => false,
        }
    }
}

impl From<SqlxError> for DatabaseError {
    fn from(err: SqlxError) -> Self {
        DatabaseError::Query(err)
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Custom error type for object storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// The stored reference is not a public storage URL
    #[error("Invalid storage URL: {0}")]
    InvalidUrl(String),

    /// Transport failure talking to the storage provider
    #[error("Storage request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The storage provider answered with an error status
    #[error("Storage provider error ({status}): {message}")]
    Provider { status: u16, message: String },
}

/// Type alias for Result with StorageError
pub type StorageResult<T> = Result<T, StorageError>;
