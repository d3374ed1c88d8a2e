//! Explicit wiring of the gateway into the consumers

use std::sync::Arc;

use scribe_core::executor::mysql::MySqlConnector;
use scribe_core::{Connector, Gateway};

use crate::auth::Authenticator;
use crate::config::{AuthConfig, Config};
use crate::error::ConfigError;
use crate::registration::Registry;

/// One gateway shared by authentication and registration
pub struct Services<C> {
    pub gateway: Arc<Gateway<C>>,
    pub auth: Authenticator<C>,
    pub registry: Registry<C>,
}

impl<C: Connector> Services<C> {
    pub fn new(connector: C, auth: &AuthConfig) -> Self {
        let gateway = Arc::new(Gateway::new(connector));
        Self {
            auth: Authenticator::new(Arc::clone(&gateway), auth.secret_key.clone()),
            registry: Registry::new(Arc::clone(&gateway), auth.bcrypt_cost),
            gateway,
        }
    }
}

impl Services<MySqlConnector> {
    /// Validate `config` and build the MySQL-backed services
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let db = &config.database;
        let connector = MySqlConnector::from_params(&db.host, db.port, &db.user, &db.password, &db.name);
        tracing::info!(host = %db.host, port = db.port, database = %db.name, "services configured");
        Ok(Self::new(connector, &config.auth))
    }
}
