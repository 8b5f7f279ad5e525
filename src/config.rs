use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ORACLE_TOKEN_ENV: &str = "TASKGATE_ORACLE_TOKEN";
pub const CONFIG_PATH_ENV: &str = "TASKGATE_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "taskgate.yaml";
const DEFAULT_ORACLE_ENDPOINT: &str =
    "https://aiproxy.sanand.workers.dev/openai/v1/chat/completions";
const DEFAULT_TRANSCRIPTION_ENDPOINT: &str =
    "https://aiproxy.sanand.workers.dev/openai/v1/audio/transcriptions";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid yaml in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("settings validation failed: {0}")]
    Settings(String),
    #[error("TASKGATE_ORACLE_TOKEN is not set in environment variables")]
    MissingOracleToken,
}

/// Immutable process-wide configuration. Built once at startup and passed by
/// reference into every component; nothing reads the environment after load.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// The single directory prefix outside of which no file operation is
    /// permitted. Shell-command authorization matches this string literally
    /// against command tokens, so the configured spelling matters.
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
    /// Fixed dispatch table: exact task text mapped to a command, consulted
    /// before the oracle.
    #[serde(default)]
    pub named_tasks: BTreeMap<String, String>,
    #[serde(default)]
    pub oracle: OracleSettings,
    #[serde(skip)]
    pub oracle_token: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OracleSettings {
    #[serde(default = "default_oracle_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_oracle_model")]
    pub model: String,
    #[serde(default = "default_oracle_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_transcription_endpoint")]
    pub transcription_endpoint: String,
}

fn default_data_root() -> PathBuf {
    PathBuf::from("./data")
}

fn default_bind_address() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_worker_threads() -> usize {
    4
}

fn default_command_timeout_secs() -> u64 {
    120
}

fn default_oracle_endpoint() -> String {
    DEFAULT_ORACLE_ENDPOINT.to_string()
}

fn default_oracle_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_oracle_timeout_secs() -> u64 {
    30
}

fn default_transcription_endpoint() -> String {
    DEFAULT_TRANSCRIPTION_ENDPOINT.to_string()
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            endpoint: default_oracle_endpoint(),
            model: default_oracle_model(),
            timeout_secs: default_oracle_timeout_secs(),
            transcription_endpoint: default_transcription_endpoint(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            bind_address: default_bind_address(),
            worker_threads: default_worker_threads(),
            command_timeout_secs: default_command_timeout_secs(),
            named_tasks: BTreeMap::new(),
            oracle: OracleSettings::default(),
            oracle_token: String::new(),
        }
    }
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let settings: Settings =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from `TASKGATE_CONFIG` (default `taskgate.yaml`),
    /// falling back to built-in defaults when no config file exists, then
    /// resolves the oracle credential from the environment. Fails fast when
    /// the credential is absent.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        let path = PathBuf::from(path);
        let mut settings = if path.exists() {
            Self::from_path(&path)?
        } else {
            Self::default()
        };
        settings.oracle_token = std::env::var(ORACLE_TOKEN_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingOracleToken)?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data_root.as_os_str().is_empty() {
            return Err(ConfigError::Settings(
                "data_root must be non-empty".to_string(),
            ));
        }
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::Settings(
                "bind_address must be non-empty".to_string(),
            ));
        }
        if self.worker_threads == 0 {
            return Err(ConfigError::Settings(
                "worker_threads must be at least 1".to_string(),
            ));
        }
        for (task, command) in &self.named_tasks {
            if command.trim().is_empty() {
                return Err(ConfigError::Settings(format!(
                    "named task `{task}` maps to an empty command"
                )));
            }
        }
        Ok(())
    }

    /// The literal root-path prefix matched against raw command tokens.
    pub fn root_prefix(&self) -> String {
        self.data_root.display().to_string()
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    pub fn history_db_path(&self) -> PathBuf {
        self.data_root.join("task_history.db")
    }

    pub fn git_working_copy_path(&self) -> PathBuf {
        self.data_root.join("repo")
    }

    pub fn gateway_log_path(&self) -> PathBuf {
        self.data_root.join("logs/gateway.log")
    }
}
