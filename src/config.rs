//! Configuration management for the filegate server
//!
//! Loads `config.toml` (optional) layered with `FILEGATE_*` environment
//! overrides. Every value is read once at startup; nothing here is mutated
//! while the server runs.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Name of the configuration file, looked up without extension
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Prefix for environment overrides (`FILEGATE_PORT`, `FILEGATE_STORAGE_ROOT`, ...)
pub const ENV_PREFIX: &str = "FILEGATE";

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(flatten)]
    pub network: NetworkConfig,

    #[serde(flatten)]
    pub storage: StorageConfig,
}

/// Listener and session limits
#[derive(Debug, Deserialize, Clone)]
pub struct NetworkConfig {
    /// IP address the command listener binds to
    pub bind_address: String,

    /// Port for the command listener (0 picks a free port)
    pub port: u16,

    /// Maximum concurrent client sessions
    pub max_clients: usize,

    /// Maximum length of a single command line, in bytes
    pub max_command_length: usize,
}

/// Gateway settings
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory every caller path is confined to
    pub storage_root: String,

    /// Largest file the gateway reads, writes or accepts, in MiB
    pub max_file_size_mb: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8421,
                max_clients: 32,
                max_command_length: 4096,
            },
            storage: StorageConfig {
                storage_root: "./faf_storage".to_string(),
                max_file_size_mb: 50,
            },
        }
    }
}

impl ServerConfig {
    /// Load configuration from `config.toml` with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from the given file (extension optional).
    ///
    /// A missing file is not an error: defaults apply and environment
    /// variables can still override them.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let defaults = Self::default();

        let settings = Config::builder()
            .set_default("bind_address", defaults.network.bind_address)?
            .set_default("port", i64::from(defaults.network.port))?
            .set_default("max_clients", defaults.network.max_clients as i64)?
            .set_default(
                "max_command_length",
                defaults.network.max_command_length as i64,
            )?
            .set_default("storage_root", defaults.storage.storage_root)?
            .set_default("max_file_size_mb", defaults.storage.max_file_size_mb as i64)?
            .add_source(File::with_name(config_path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.network.bind_address.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "bind_address cannot be empty".into(),
            ));
        }

        if self.network.socket_addr().is_none() {
            return Err(config::ConfigError::Message(format!(
                "bind_address must be an IP address, got {:?}",
                self.network.bind_address
            )));
        }

        if self.network.max_clients == 0 {
            return Err(config::ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.network.max_command_length < 16 {
            return Err(config::ConfigError::Message(
                "max_command_length must be at least 16 bytes".into(),
            ));
        }

        if self.storage.storage_root.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "storage_root cannot be empty".into(),
            ));
        }

        if self.storage.max_file_size_mb == 0 {
            return Err(config::ConfigError::Message(
                "max_file_size_mb must be greater than 0".into(),
            ));
        }

        if self
            .storage
            .max_file_size_mb
            .checked_mul(BYTES_PER_MB)
            .is_none()
        {
            return Err(config::ConfigError::Message(format!(
                "max_file_size_mb must be at most {}",
                u64::MAX / BYTES_PER_MB
            )));
        }

        Ok(())
    }
}

impl NetworkConfig {
    /// Bind address and port as a socket address string
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Parsed socket address, if the bind address is a literal IP
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.listen_socket().parse().ok()
    }
}

impl StorageConfig {
    /// Storage root as configured (not yet canonicalized)
    pub fn storage_root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    /// Maximum file size in bytes
    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(BYTES_PER_MB)
    }
}
