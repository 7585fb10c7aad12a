// src/config.rs
//
// Service configuration. Precedence: defaults < TOML file < environment.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::domain::pagination::PAGE_SIZE_OPTIONS;
use crate::domain::session::SessionContext;

pub const CONFIG_PATH_ENV: &str = "AGENT_DESK_CONFIG";
pub const BIND_ENV: &str = "AGENT_DESK_BIND";
pub const DB_PATH_ENV: &str = "AGENT_DESK_DB";
pub const DEFAULT_CONFIG_FILE: &str = "agent_desk.toml";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Invalid TOML in {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Invalid value in {path}: {reason}")]
    InvalidValue { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub limits: LimitsConfig,
    pub insights: InsightsConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub max_workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".into(),
            max_workers: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "agent_desk.sqlite3".into(),
        }
    }
}

/// Fallback identity when a request carries no session headers.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub brokerage_id: String,
    pub agent_id: String,
    pub user_id: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            brokerage_id: "brk_default".into(),
            agent_id: "agent_default".into(),
            user_id: "user_default".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    pub max_import_bytes: usize,
    pub max_export_rows: usize,
    pub default_page_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_import_bytes: 5 * 1024 * 1024,
            max_export_rows: 10_000,
            default_page_size: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct InsightsConfig {
    /// No endpoint means insights are disabled and always return the placeholder.
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl AppConfig {
    /// Loads from `$AGENT_DESK_CONFIG`, else `./agent_desk.toml` if present,
    /// else defaults; then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        let path = explicit.or_else(|| {
            let p = PathBuf::from(DEFAULT_CONFIG_FILE);
            p.exists().then_some(p)
        });

        let config = match path {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text, path)
    }

    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let size = self.limits.default_page_size;
        if !PAGE_SIZE_OPTIONS.contains(&size) {
            return Err(ConfigError::InvalidValue {
                path: path.to_path_buf(),
                reason: format!(
                    "limits.default_page_size = {size}, expected one of {PAGE_SIZE_OPTIONS:?}"
                ),
            });
        }
        Ok(())
    }

    /// `lookup` is `std::env::var` in production.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(bind) = lookup(BIND_ENV).filter(|v| !v.trim().is_empty()) {
            self.server.bind = bind;
        }
        if let Some(path) = lookup(DB_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            self.database.path = path;
        }
        self
    }

    pub fn default_session(&self) -> SessionContext {
        SessionContext::new(
            self.session.brokerage_id.clone(),
            self.session.agent_id.clone(),
            self.session.user_id.clone(),
        )
    }
}
