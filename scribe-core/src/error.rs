//! Error types for Scribe

use thiserror::Error;

/// The main error type for statement compilation and execution
#[derive(Error, Debug)]
pub enum Error {
    /// Structurally invalid request: unsupported mode, missing table,
    /// missing columns/values, bad join parameters
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// A column, value or condition input could not be parsed
    #[error("Format error: {message}")]
    Format { message: String },

    /// Driver-level failure: connectivity, constraint violation, syntax
    #[error("Execution error: {0}")]
    Execution(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience Result type for Scribe operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new format error
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create an execution error that did not originate in the driver
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(sqlx::Error::Protocol(message.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = Error::validation("no table is specified");
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(err.to_string(), "Validation error: no table is specified");
    }

    #[test]
    fn test_format_error() {
        let err = Error::format("invalid columns input");
        assert!(matches!(err, Error::Format { .. }));
        assert_eq!(err.to_string(), "Format error: invalid columns input");
    }

    #[test]
    fn test_execution_error() {
        let err = Error::execution("connection refused");
        assert!(matches!(err, Error::Execution(_)));
        assert!(err.to_string().starts_with("Execution error:"));
        assert!(err.to_string().contains("connection refused"));
    }
}
