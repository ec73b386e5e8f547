//! Workspace discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::config::BackendKind;

/// Name of the marker directory at the workspace root
const MARKER_DIR: &str = ".ptrack";

/// A directory tree managed by the tracker (parent of `.ptrack/`)
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Find the workspace root by walking up from the current directory
    pub fn discover() -> Result<Self, WorkspaceError> {
        let current =
            std::env::current_dir().map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find the workspace root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, WorkspaceError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        loop {
            if current.join(MARKER_DIR).is_dir() {
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(WorkspaceError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new workspace at the given path
    pub fn init(path: &Path, backend: BackendKind) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(MARKER_DIR).exists() {
            return Err(WorkspaceError::AlreadyExists(root));
        }

        Self::init_force(&root, backend)
    }

    /// Initialize even if `.ptrack/` exists, rewriting the default config
    pub fn init_force(path: &Path, backend: BackendKind) -> Result<Self, WorkspaceError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let ws = Self { root };

        std::fs::create_dir_all(ws.marker_dir())
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        std::fs::create_dir_all(ws.data_dir())
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;
        std::fs::write(ws.config_path(), Self::default_config(backend))
            .map_err(|e| WorkspaceError::IoError(e.to_string()))?;

        Ok(ws)
    }

    fn default_config(backend: BackendKind) -> String {
        format!(
            r#"# Project Tracker workspace configuration

# Storage backend: sqlite, xml or csv
backend: {}

# Directory for data files, relative to the workspace root
data_dir: data

# Actor recorded in audit records (default: git user.name, then $USER)
# actor: ""

audit:
  enabled: true
"#,
            backend
        )
    }

    /// Get the workspace root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the `.ptrack` directory
    pub fn marker_dir(&self) -> PathBuf {
        self.root.join(MARKER_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.marker_dir().join("config.yaml")
    }

    /// Default data directory
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }
}

/// Errors that can occur during workspace operations
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("not a ptrack workspace (searched from {searched_from:?}). Run 'ptrack init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("ptrack workspace already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}
