//! Configuration loading for sync-daemon.
//!
//! Configuration is loaded from a TOML file (default: `twiliodb.toml`).

use serde::Deserialize;
use std::path::PathBuf;
use sync_types::ResourceType;

/// Environment variable consulted when `account.auth_token` is absent.
pub const AUTH_TOKEN_ENV: &str = "TWILIO_AUTH_TOKEN";

/// Root configuration for sync-daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Remote account configuration.
    pub account: AccountConfig,
    /// Local storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Synchronization loop configuration.
    #[serde(default)]
    pub sync: SyncConfig,
    /// Recording download configuration.
    #[serde(default)]
    pub recordings: RecordingsConfig,
    /// HTTP endpoints configuration.
    #[serde(default)]
    pub http: HttpConfig,
}

/// Remote account configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    /// Account sid (`AC...`).
    #[serde(default)]
    pub sid: String,
    /// Auth token; falls back to `TWILIO_AUTH_TOKEN`.
    pub auth_token: Option<String>,
    /// REST API base URL (default: https://api.twilio.com).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// REST API version path segment (default: 2010-04-01).
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Local storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to SQLite database file.
    #[serde(default = "default_database_path")]
    pub database: PathBuf,
    /// Where to persist engine state between runs (optional).
    pub state_file: Option<PathBuf>,
}

/// Synchronization loop configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Seconds to sleep between cycles (default: 5).
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Records requested per page (default: 50).
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Run a single cycle and exit (default: false).
    #[serde(default)]
    pub one_shot: bool,
    /// Resource types to synchronize.
    #[serde(default = "default_resources")]
    pub resources: Vec<ResourceType>,
}

/// Audio format of downloaded recordings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingFormat {
    /// WAV (the default).
    #[default]
    Wav,
    /// MP3.
    Mp3,
}

impl RecordingFormat {
    /// File extension, also used in the media URL.
    pub fn extension(&self) -> &'static str {
        match self {
            RecordingFormat::Wav => "wav",
            RecordingFormat::Mp3 => "mp3",
        }
    }
}

/// Recording download configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordingsConfig {
    /// Download audio of completed recordings (default: false).
    #[serde(default)]
    pub enabled: bool,
    /// Directory receiving `{sid}.{format}` files (default: recordings).
    #[serde(default = "default_recordings_dir")]
    pub output_dir: PathBuf,
    /// Audio format (default: wav).
    #[serde(default)]
    pub format: RecordingFormat,
}

/// HTTP endpoints configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Serve `/health` and `/metrics` (default: false).
    #[serde(default)]
    pub enabled: bool,
    /// Bind address for HTTP server (default: 127.0.0.1:9090).
    #[serde(default = "default_http_bind")]
    pub bind_address: String,
}

// Default value functions
fn default_base_url() -> String {
    "https://api.twilio.com".to_string()
}

fn default_api_version() -> String {
    "2010-04-01".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_database_path() -> PathBuf {
    PathBuf::from("twiliodb.db")
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_page_size() -> u32 {
    50
}

fn default_resources() -> Vec<ResourceType> {
    vec![
        ResourceType::Account,
        ResourceType::Call,
        ResourceType::SmsMessage,
        ResourceType::Recording,
        ResourceType::Transcription,
        ResourceType::Notification,
        ResourceType::Conference,
    ]
}

fn default_recordings_dir() -> PathBuf {
    PathBuf::from("recordings")
}

fn default_http_bind() -> String {
    "127.0.0.1:9090".to_string()
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            sid: String::new(),
            auth_token: None,
            base_url: default_base_url(),
            api_version: default_api_version(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database_path(),
            state_file: None,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            page_size: default_page_size(),
            one_shot: false,
            resources: default_resources(),
        }
    }
}

impl Default for RecordingsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            output_dir: default_recordings_dir(),
            format: RecordingFormat::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: default_http_bind(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account: AccountConfig::default(),
            storage: StorageConfig::default(),
            sync: SyncConfig::default(),
            recordings: RecordingsConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Fill the auth token from the environment when the file has none.
    pub fn with_env_auth_token(mut self) -> Self {
        self.apply_auth_token(std::env::var(AUTH_TOKEN_ENV).ok());
        self
    }

    fn apply_auth_token(&mut self, from_env: Option<String>) {
        if self.account.auth_token.is_none() {
            self.account.auth_token = from_env.filter(|t| !t.is_empty());
        }
    }

    /// Check everything needed before the first cycle.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.account.sid.is_empty() {
            return Err(ConfigError::Missing("account.sid"));
        }
        if self.account.auth_token.as_deref().unwrap_or_default().is_empty() {
            return Err(ConfigError::Missing("account.auth_token"));
        }
        if self.storage.database.as_os_str().is_empty() {
            return Err(ConfigError::Missing("storage.database"));
        }
        if self.sync.page_size == 0 {
            return Err(ConfigError::Invalid {
                field: "sync.page_size",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.sync.resources.is_empty() {
            return Err(ConfigError::Invalid {
                field: "sync.resources",
                reason: "no resource type enabled".to_string(),
            });
        }
        if self.recordings.enabled && !self.sync.resources.contains(&ResourceType::Recording) {
            return Err(ConfigError::Invalid {
                field: "recordings.enabled",
                reason: "recording is not in sync.resources".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A required setting is missing.
    #[error("missing required setting {0}")]
    Missing(&'static str),
    /// A setting has an unusable value.
    #[error("invalid setting {field}: {reason}")]
    Invalid {
        /// Offending setting.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}
