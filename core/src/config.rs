//! Layered client configuration using figment.
//!
//! Sources, highest priority first:
//! 1. Environment variables with the `ADMIN_CLIENT_` prefix
//!    (`ADMIN_CLIENT_BASE_URL`, `ADMIN_CLIENT_TOKEN_DIR`, ...)
//! 2. `admin-client.toml` in the working directory
//! 3. Built-in defaults

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::{FileTokenStore, StorageError};

pub const CONFIG_FILE: &str = "admin-client.toml";
pub const ENV_PREFIX: &str = "ADMIN_CLIENT_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(#[from] figment::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Directory holding the persisted token. `None` means the platform
    /// data directory.
    #[serde(default)]
    pub token_dir: Option<PathBuf>,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            token_dir: None,
            user_agent: concat!("admin-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn token_store(&self) -> Result<FileTokenStore, StorageError> {
        match &self.token_dir {
            Some(dir) => Ok(FileTokenStore::new(dir)),
            None => FileTokenStore::default_location(),
        }
    }
}
