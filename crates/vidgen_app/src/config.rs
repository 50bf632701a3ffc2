//! `vidgen.ron` configuration. Every field has a default, so an empty or
//! missing file is valid.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;
use vidgen_engine::{ClientSettings, CompletionSettings, PollSettings, SubmitEncoding};

pub const DEFAULT_CONFIG_FILE: &str = "vidgen.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
    #[error("invalid log level {0:?}")]
    LogLevel(String),
    #[error("polling interval must be at least 1 ms")]
    ZeroInterval,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[default]
    Query,
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub submit_path: String,
    pub status_path: String,
    pub encoding: Encoding,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_response_bytes: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        Self {
            base_url: client.base_url,
            submit_path: client.submit_path,
            status_path: client.status_path,
            encoding: Encoding::Query,
            connect_timeout_secs: client.connect_timeout.as_secs(),
            request_timeout_secs: client.request_timeout.as_secs(),
            max_response_bytes: client.max_bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_ms: u64,
    /// `None` means no limit.
    pub max_attempts: Option<u32>,
    pub max_wait_secs: Option<u64>,
    pub poll_immediately: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        let poll = PollSettings::default();
        Self {
            interval_ms: poll.interval.as_millis() as u64,
            max_attempts: poll.max_attempts,
            max_wait_secs: poll.max_duration.map(|limit| limit.as_secs()),
            poll_immediately: poll.poll_immediately,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(default)]
pub struct EnhanceConfig {
    pub openai_api_key: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub polling: PollingConfig,
    pub enhance: EnhanceConfig,
    pub ledger_path: PathBuf,
    pub log_file: PathBuf,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            polling: PollingConfig::default(),
            enhance: EnhanceConfig::default(),
            ledger_path: PathBuf::from("vidgen_ledger.ron"),
            log_file: PathBuf::from(vidgen_logging::DEFAULT_LOG_FILE),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads `path`, or `vidgen.ron` in the working directory when no path is
    /// given. Only an explicitly named file is required to exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        match fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text, &path),
            Err(err) if !required && err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    pub fn parse(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text).map_err(|err| ConfigError::Parse {
            path: origin.display().to_string(),
            message: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would make the poller spin.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.polling.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(())
    }

    pub fn level(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }

    pub fn client_settings(&self) -> ClientSettings {
        let backend = &self.backend;
        ClientSettings {
            base_url: backend.base_url.clone(),
            submit_path: backend.submit_path.clone(),
            status_path: backend.status_path.clone(),
            encoding: match backend.encoding {
                Encoding::Query => SubmitEncoding::Query,
                Encoding::Json => SubmitEncoding::Json,
            },
            connect_timeout: Duration::from_secs(backend.connect_timeout_secs),
            request_timeout: Duration::from_secs(backend.request_timeout_secs),
            max_bytes: backend.max_response_bytes,
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.polling.interval_ms),
            max_attempts: self.polling.max_attempts,
            max_duration: self.polling.max_wait_secs.map(Duration::from_secs),
            poll_immediately: self.polling.poll_immediately,
            ..PollSettings::default()
        }
    }

    /// Settings for the hosted enhancer, when an API key is configured.
    pub fn completion_settings(&self) -> Option<CompletionSettings> {
        let key = self
            .enhance
            .openai_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())?;
        let mut settings = CompletionSettings::new(key.trim());
        if let Some(model) = &self.enhance.model {
            settings.model = model.clone();
        }
        if let Some(endpoint) = &self.enhance.endpoint {
            settings.endpoint = endpoint.clone();
        }
        Some(settings)
    }
}
