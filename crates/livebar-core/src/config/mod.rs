//! Config - 設定ファイルの読み込みと保存
//!
//! The settings file is JSON. It is validated against an explicit schema
//! before being decoded, so an operator sees every problem at once instead of
//! the first one serde trips over.

pub mod file_store;
pub mod schema;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::DestinationState;

pub use self::file_store::FileSettingsStore;
pub use self::schema::validate;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Full settings snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Reddit app client id.
    pub client: String,
    /// Reddit app secret.
    pub secret: String,
    pub user_agent: String,
    pub username: String,
    pub password: String,
    pub twitch_client_id: String,
    pub twitch_client_secret: String,
    /// Seconds between cycles.
    pub delay: u64,
    pub subreddits: Vec<DestinationState>,
    /// Keys the bot does not interpret, written back untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Settings {
    /// Validates then decodes a raw JSON value.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let issues = validate(&value);
        if !issues.is_empty() {
            return Err(ConfigError::Invalid { issues });
        }
        serde_json::from_value(value).map_err(|e| ConfigError::Invalid {
            issues: vec![ConfigIssue::new("$", e.to_string())],
        })
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let value = serde_json::from_str(text).map_err(ConfigError::Parse)?;
        Self::from_value(value)
    }

    pub fn cycle_delay(&self) -> Duration {
        Duration::from_secs(self.delay)
    }

    /// Pretty-printed JSON, the layout written back to disk.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn destination(&self, name: &str) -> Option<&DestinationState> {
        self.subreddits.iter().find(|s| s.name == name)
    }
}

/// Reads and validates the settings file at `path`.
pub fn load(path: &Path) -> Result<Settings, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let settings = Settings::from_json(&text)?;
    tracing::info!(
        path = %path.display(),
        subreddits = settings.subreddits.len(),
        "Loaded configuration"
    );
    Ok(settings)
}

/// One missing or invalid field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Location in the file, e.g. `subreddits[1].top_cut`.
    pub path: String,
    pub problem: String,
}

impl ConfigIssue {
    pub fn new(path: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            problem: problem.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.problem)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("config file is not valid JSON: {0}")]
    Parse(serde_json::Error),

    #[error("invalid configuration ({} problem(s)):\n{}", .issues.len(), render_issues(.issues))]
    Invalid { issues: Vec<ConfigIssue> },
}

impl ConfigError {
    /// Every schema problem, empty for read / parse failures.
    pub fn issues(&self) -> &[ConfigIssue] {
        match self {
            ConfigError::Invalid { issues } => issues,
            _ => &[],
        }
    }
}

fn render_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("    note: {issue}"))
        .collect::<Vec<_>>()
        .join("\n")
}
