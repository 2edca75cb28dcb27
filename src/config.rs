//! Configuration for service-desk
//!
//! Sources are layered, later ones winning:
//!
//! 1. built-in defaults
//! 2. a YAML file (`service-desk.yaml` in the data directory, or `--config`)
//! 3. environment variables such as `SERVICE_DESK__SERVER__PORT=9000`

use crate::error::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the configuration file looked up in the data directory
pub const CONFIG_FILE_NAME: &str = "service-desk.yaml";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "SERVICE_DESK";

/// Effective configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub notifications: NotificationConfig,
}

/// HTTP / WebSocket listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Which storage backend to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    #[default]
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: default_data_dir(),
        }
    }
}

/// Delivery settings for the notification dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Upper bound for one live broadcast or email send
    pub delivery_timeout_ms: u64,
    /// Buffered payloads per live connection before deliveries are dropped
    pub channel_capacity: usize,
    pub email_enabled: bool,
    pub from_address: String,
    /// Tera template for the email subject
    pub subject_template: String,
    /// Tera template for the email body
    pub body_template: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            delivery_timeout_ms: 2_000,
            channel_capacity: 32,
            email_enabled: true,
            from_address: "noreply@servicedesk.local".to_string(),
            subject_template: "Ticket Update: #{{ ticket_short_id }}".to_string(),
            body_template: "Hello {{ recipient }},\n\n{{ message }}\n\nTicket: {{ ticket_title }}\nStatus: {{ ticket_status }}\n".to_string(),
        }
    }
}

impl NotificationConfig {
    #[must_use]
    pub const fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }
}

/// Platform data directory, falling back to `./.service-desk`
#[must_use]
pub fn default_data_dir() -> PathBuf {
    ProjectDirs::from("lk", "naita", "service-desk").map_or_else(
        || PathBuf::from(".service-desk"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

impl Config {
    /// Loads configuration from defaults, an optional file and the environment
    ///
    /// When `file` is `None`, `service-desk.yaml` in the default data
    /// directory is used if it exists.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = file.map_or_else(|| default_data_dir().join(CONFIG_FILE_NAME), Path::to_path_buf);

        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(config::File::from(file).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Loads configuration, falling back to defaults on any error
    #[must_use]
    pub fn load_or_default() -> Self {
        Self::load(None).unwrap_or_else(|e| {
            tracing::warn!("Ignoring unreadable configuration: {e}");
            Self::default()
        })
    }

    /// Renders the configuration as YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
