//! Error type shared by every hacksteader crate.
//!
//! Storage failures are sorted into the kinds a caller can act on: a missing
//! row, a duplicate key, a dangling reference, or a value the schema refuses.

use std::fmt;

/// Unified error type for hacksteader.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "plant", "hacksteader").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// A row with the same primary key or unique value already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A write referenced a row that does not exist.
    #[error("Foreign key violation: {0}")]
    ForeignKey(String),

    /// A value was rejected by a CHECK constraint or could not be decoded.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A database operation failed.
    #[error("Database error: {source}")]
    Database {
        /// The underlying database error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// True for the constraint kinds: conflict, foreign key and validation.
    pub fn is_constraint(&self) -> bool {
        matches!(
            self,
            Error::Conflict(_) | Error::ForeignKey(_) | Error::Validation(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Validation(format!("malformed JSON value: {e}"))
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
