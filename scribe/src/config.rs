//! TOML configuration with environment overrides

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "SCRIBE_CONFIG";

/// File looked up in the working directory when `SCRIBE_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "scribe.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub log: LogConfig,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub secret_key: String,
    pub bcrypt_cost: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    pub json: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            name: String::new(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &"***")
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl Config {
    /// Load from `SCRIBE_CONFIG` (or `./scribe.toml` when present), apply
    /// environment overrides and validate.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .ok()
            .or_else(|| {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.exists().then_some(default)
            });

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => {
                tracing::debug!("no configuration file, using defaults");
                Self::default()
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration file without overrides or validation
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "reading configuration");
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply `DB_*` and `SECRET_KEY` overrides from `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("DB_HOST") {
            self.database.host = host;
        }
        if let Some(port) = lookup("DB_PORT") {
            self.database.port = port.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    key: "DB_PORT",
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(user) = lookup("DB_USER") {
            self.database.user = user;
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            self.database.password = password;
        }
        if let Some(name) = lookup("DB_DATABASE") {
            self.database.name = name;
        }
        if let Some(secret) = lookup("SECRET_KEY") {
            self.auth.secret_key = secret;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.secret_key.is_empty() {
            return Err(ConfigError::MissingValue("auth.secret_key"));
        }
        if self.database.name.is_empty() {
            return Err(ConfigError::MissingValue("database.name"));
        }
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(ConfigError::InvalidValue {
                key: "auth.bcrypt_cost",
                reason: format!("{} is outside 4..=31", self.auth.bcrypt_cost),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[database]
host = "db.internal"
name = "auth"

[auth]
secret_key = "s3cret"
bcrypt_cost = 10

[log]
json = true
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 3306);
        assert_eq!(config.database.name, "auth");
        assert_eq!(config.auth.bcrypt_cost, 10);
        assert_eq!(config.log.level, "info");
        assert!(config.log.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database\nhost = ").unwrap();
        let err = Config::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::TomlDeError(_)));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                ("DB_HOST", "10.0.0.5"),
                ("DB_PORT", "3307"),
                ("DB_USER", "app"),
                ("DB_PASSWORD", "pw"),
                ("DB_DATABASE", "users"),
                ("SECRET_KEY", "k"),
            ]))
            .unwrap();

        assert_eq!(config.database.host, "10.0.0.5");
        assert_eq!(config.database.port, 3307);
        assert_eq!(config.database.user, "app");
        assert_eq!(config.database.password, "pw");
        assert_eq!(config.database.name, "users");
        assert_eq!(config.auth.secret_key, "k");
    }

    #[test]
    fn test_invalid_port_override() {
        let mut config = Config::default();
        let err = config.apply_overrides(env(&[("DB_PORT", "abc")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "DB_PORT", .. }));
    }

    #[test]
    fn test_missing_secret_fails_validation() {
        let mut config = Config::default();
        config.database.name = "auth".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingValue("auth.secret_key")));
    }

    #[test]
    fn test_bcrypt_cost_bounds() {
        let mut config = Config::default();
        config.database.name = "auth".to_string();
        config.auth.secret_key = "k".to_string();
        config.auth.bcrypt_cost = 3;
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InvalidValue { key: "auth.bcrypt_cost", .. }
        ));
    }

    #[test]
    fn test_debug_masks_secrets() {
        let mut config = Config::default();
        config.database.password = "hunter2".to_string();
        config.auth.secret_key = "topsecret".to_string();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("topsecret"));
    }
}
