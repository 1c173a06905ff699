// common/src/config.rs
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use config::{Config as ConfigFile, File, Environment};

/// Central configuration for the admin client
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the clinic service, e.g. `http://127.0.0.1:5000/api`
    pub api_base_url: String,
    /// How long a notification stays visible
    pub notification_ttl_ms: u64,
    /// Per-request timeout. Unset means requests wait for the service.
    pub request_timeout_secs: Option<u64>,
    pub log_level: String,

    // Persisted identity configuration
    pub session: SessionConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// File holding the persisted identity
    pub file: PathBuf,
    /// Storage key of the identity record inside that file
    pub key: String,
    /// Poll interval for noticing changes made by other processes
    pub poll_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("./.clinic-admin/session.json"),
            key: "clinic.identity".to_string(),
            poll_ms: 1000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000/api".to_string(),
            notification_ttl_ms: 3000,
            request_timeout_secs: None,
            log_level: "info".to_string(),
            session: SessionConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        // Get the run mode, defaulting to "development"
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        // Locate the config directory
        let config_dir = env::var("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                // Check if we're in the project root or a subcrate
                let mut path = PathBuf::from("./config");
                if !path.exists() {
                    path = PathBuf::from("../config");
                }
                path
            });

        tracing::debug!("Loading configuration from {}", config_dir.display());
        tracing::debug!("Using run mode: {}", run_mode);

        let config = ConfigFile::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", run_mode))).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // APP__API_BASE_URL, APP__SESSION__FILE, ...
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load from files, falling back to plain environment variables
    pub fn from_env() -> Self {
        match Self::load() {
            Ok(config) => {
                tracing::debug!("Configuration loaded from files and environment");
                config
            },
            Err(e) => {
                tracing::warn!("Failed to load configuration from files: {}", e);
                tracing::info!("Falling back to environment variables only");

                let defaults = Self::default();

                let api_base_url = env::var("CLINIC_API_URL")
                    .unwrap_or(defaults.api_base_url);

                let notification_ttl_ms = env::var("CLINIC_NOTIFICATION_TTL_MS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(defaults.notification_ttl_ms);

                let request_timeout_secs = env::var("CLINIC_REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok());

                let log_level = env::var("CLINIC_LOG_LEVEL")
                    .unwrap_or(defaults.log_level);

                let session_file = env::var("CLINIC_SESSION_FILE")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.session.file);

                Self {
                    api_base_url,
                    notification_ttl_ms,
                    request_timeout_secs,
                    log_level,
                    session: SessionConfig {
                        file: session_file,
                        ..defaults.session
                    },
                }
            }
        }
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn session_poll_interval(&self) -> Duration {
        // A zero interval would spin the watcher
        Duration::from_millis(self.session.poll_ms.max(50))
    }
}
