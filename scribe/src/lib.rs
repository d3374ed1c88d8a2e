//! Scribe - JWT login and user registration backed by the scribe statement
//! gateway
//!
//! The database layer lives in [`scribe_core`]; this crate holds its
//! consumers plus the configuration and logging they run with.
//!
//! ```no_run
//! use scribe::{Config, LoginRequest, Services};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load()?;
//! scribe::setup_logging(&config.log)?;
//! let services = Services::from_config(&config)?;
//!
//! let response = services
//!     .auth
//!     .login(LoginRequest {
//!         username: Some("chkhong".to_string()),
//!         password: Some("12345678".to_string()),
//!         ..LoginRequest::default()
//!     })
//!     .await;
//! println!("{}", response.message);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod password;
pub mod registration;
pub mod response;
pub mod services;

pub use auth::{Authenticator, Claims, LoginRequest};
pub use config::{AuthConfig, Config, DatabaseConfig, LogConfig};
pub use error::{AuthError, AuthResult, ConfigError, TokenError};
pub use logging::setup_logging;
pub use registration::{NewUser, Registry, UserUpdate};
pub use response::Response;
pub use services::Services;

// Re-export the statement layer
pub use scribe_core;
