//! Error types for the authentication and registration services

use thiserror::Error;

/// Configuration loading failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDeError(#[from] toml::de::Error),

    #[error("Missing configuration value: {0}")]
    MissingValue(&'static str),

    #[error("Invalid configuration value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

/// Why a token was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// No `token_log` row carries this token
    #[error("Token not found")]
    NotFound,

    /// Bad structure or signature
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// Well-formed and signed, but past its `exp`
    #[error("Token expired")]
    Expired,
}

/// Authentication and registration failures
#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Hashing error: {0}")]
    HashingError(String),

    #[error("Token signing error: {0}")]
    SigningError(String),

    /// A gateway call came back with `success=false`
    #[error("Database error: {0}")]
    Database(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_error_is_transparent() {
        let err = AuthError::from(TokenError::Expired);
        assert_eq!(err.to_string(), "Token expired");
        assert!(matches!(err, AuthError::Token(TokenError::Expired)));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingValue("auth.secret_key");
        assert_eq!(err.to_string(), "Missing configuration value: auth.secret_key");
    }
}
