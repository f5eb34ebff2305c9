//! Error types for chainsql

use crate::builder::StatementKind;
use thiserror::Error;

/// The main error type for chainsql operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database connection or execution error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Row (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// SQL text was requested before any of select/insert/update/delete
    #[error("No statement to build: call select, insert, update or delete first")]
    NoStatement,

    /// The statement has no FROM/INTO table registered
    #[error("{kind} requires a table: call from() or into() first")]
    MissingTable { kind: StatementKind },

    /// Invalid query configuration
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    /// Connection configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Convenience Result type for chainsql operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new invalid query error
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error is a builder precondition failure (as opposed to
    /// something reported by the database or a decoder)
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Error::NoStatement | Error::MissingTable { .. } | Error::InvalidQuery { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_query_error() {
        let err = Error::invalid_query("UPDATE requires SET fields");
        assert!(matches!(err, Error::InvalidQuery { .. }));
        assert_eq!(err.to_string(), "Invalid query: UPDATE requires SET fields");
        assert!(err.is_precondition());
    }

    #[test]
    fn test_missing_table_error() {
        let err = Error::MissingTable {
            kind: StatementKind::Delete,
        };
        assert_eq!(
            err.to_string(),
            "DELETE requires a table: call from() or into() first"
        );
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("DATABASE_URL is not set");
        assert_eq!(err.to_string(), "Configuration error: DATABASE_URL is not set");
        assert!(!err.is_precondition());
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
