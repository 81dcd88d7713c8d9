//! Mock server settings, read from `MOCK_*` environment variables.

use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid mock server configuration: {0}")]
    Invalid(#[from] figment::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MockConfig {
    pub port: u16,
    /// Seeded superuser, always present at startup.
    pub superuser_email: String,
    pub superuser_password: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            superuser_email: "admin@example.com".to_string(),
            superuser_password: "changethis".to_string(),
        }
    }
}

impl MockConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::prefixed("MOCK_"))
            .extract()
            .map_err(ConfigError::from)
    }
}
