//! Configuration management with layered hierarchy
//!
//! The resolved [`Config`] is an explicit value handed to
//! [`DataProvider::open`](crate::storage::DataProvider::open); nothing reads
//! configuration lazily from global state.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::workspace::Workspace;

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Relational backend (SQLite file)
    #[default]
    Sqlite,
    /// One XML file per entity kind
    Xml,
    /// One CSV file per entity kind
    Csv,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Sqlite => write!(f, "sqlite"),
            BackendKind::Xml => write!(f, "xml"),
            BackendKind::Csv => write!(f, "csv"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "sql" | "db" => Ok(BackendKind::Sqlite),
            "xml" => Ok(BackendKind::Xml),
            "csv" => Ok(BackendKind::Csv),
            _ => Err(format!("Unknown backend: {}", s)),
        }
    }
}

/// Audit trail settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Write audit records (default: true)
    pub enabled: Option<bool>,

    /// Directory for the JSON-lines trail (default: `{data_dir}/audit`)
    pub dir: Option<PathBuf>,
}

/// Tracker configuration with layered hierarchy
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage backend
    pub backend: Option<BackendKind>,

    /// Directory holding the data files
    pub data_dir: Option<PathBuf>,

    /// SQLite database file name inside `data_dir`
    pub database: Option<String>,

    /// Name recorded as the actor of audit records
    pub actor: Option<String>,

    pub audit: AuditConfig,
}

impl Config {
    /// Configuration for a given backend and data directory, with no file or
    /// environment lookups
    pub fn with_data_dir(backend: BackendKind, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend: Some(backend),
            data_dir: Some(data_dir.into()),
            ..Self::default()
        }
    }

    /// Load configuration from all sources, merging in priority order
    pub fn load(workspace: Option<&Workspace>) -> Self {
        let mut config = Config::default();

        // 1. Global user config (~/.config/ptrack/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if let Some(global) = Self::read_file(&global_path) {
                config.merge(global);
            }
        }

        // 2. Workspace config (.ptrack/config.yaml); relative paths are
        //    resolved against the workspace root
        if let Some(ws) = workspace {
            if let Some(mut local) = Self::read_file(&ws.config_path()) {
                if let Some(dir) = local.data_dir.take() {
                    local.data_dir = Some(ws.root().join(dir));
                }
                if let Some(dir) = local.audit.dir.take() {
                    local.audit.dir = Some(ws.root().join(dir));
                }
                config.merge(local);
            }
            if config.data_dir.is_none() {
                config.data_dir = Some(ws.data_dir());
            }
        }

        // 3. Environment variables
        if let Ok(backend) = std::env::var("PTRACK_BACKEND") {
            match backend.parse() {
                Ok(kind) => config.backend = Some(kind),
                Err(e) => tracing::warn!("ignoring PTRACK_BACKEND: {}", e),
            }
        }
        if let Ok(actor) = std::env::var("PTRACK_ACTOR") {
            config.actor = Some(actor);
        }
        if let Ok(dir) = std::env::var("PTRACK_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }

        config
    }

    fn read_file(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str::<Config>(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("ignoring malformed config {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "ptrack")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.backend.is_some() {
            self.backend = other.backend;
        }
        if other.data_dir.is_some() {
            self.data_dir = other.data_dir;
        }
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.actor.is_some() {
            self.actor = other.actor;
        }
        if other.audit.enabled.is_some() {
            self.audit.enabled = other.audit.enabled;
        }
        if other.audit.dir.is_some() {
            self.audit.dir = other.audit.dir;
        }
    }

    pub fn backend(&self) -> BackendKind {
        self.backend.unwrap_or_default()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("data"))
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir()
            .join(self.database.as_deref().unwrap_or("tracker.db"))
    }

    pub fn audit_enabled(&self) -> bool {
        self.audit.enabled.unwrap_or(true)
    }

    pub fn audit_dir(&self) -> PathBuf {
        self.audit
            .dir
            .clone()
            .unwrap_or_else(|| self.data_dir().join("audit"))
    }

    /// Get the actor name, falling back to git config or username
    pub fn actor(&self) -> String {
        if let Some(ref actor) = self.actor {
            return actor.clone();
        }

        if let Ok(output) = std::process::Command::new("git")
            .args(["config", "user.name"])
            .output()
        {
            if output.status.success() {
                let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !name.is_empty() {
                    return name;
                }
            }
        }

        std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_other() {
        let mut base = Config::with_data_dir(BackendKind::Sqlite, "/tmp/a");
        let other: Config = serde_yml::from_str("backend: csv\naudit:\n  enabled: false\n").unwrap();

        base.merge(other);

        assert_eq!(base.backend(), BackendKind::Csv);
        assert_eq!(base.data_dir(), PathBuf::from("/tmp/a"));
        assert!(!base.audit_enabled());
    }

    #[test]
    fn test_defaults() {
        let config = Config::with_data_dir(BackendKind::Xml, "/srv/data");
        assert_eq!(config.database_path(), PathBuf::from("/srv/data/tracker.db"));
        assert_eq!(config.audit_dir(), PathBuf::from("/srv/data/audit"));
        assert!(config.audit_enabled());
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("XML".parse::<BackendKind>(), Ok(BackendKind::Xml));
        assert!("mongo".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_actor_explicit() {
        let config = Config {
            actor: Some("auditor".to_string()),
            ..Config::default()
        };
        assert_eq!(config.actor(), "auditor");
    }
}
