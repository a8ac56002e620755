//! On-disk configuration.
//!
//! Every path is optional. Unset paths derive from the data directory:
//!
//! ```json
//! {
//!   "dataDir": "~/.local/share/warden",
//!   "policyFile": "permissions.json",
//!   "auditLog": "/var/log/warden/audit.log",
//!   "risk": { "deploy": "critical" }
//! }
//! ```
//!
//! Relative `policyFile` and `auditLog` paths resolve against the data
//! directory. `~` is expanded in all three.

use crate::risk::{RiskCatalog, RiskTier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const POLICY_FILE_NAME: &str = "permissions.json";
pub const AUDIT_LOG_NAME: &str = "audit.log";

/// Errors loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardenConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_file: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_log: Option<PathBuf>,

    /// Risk tier overrides, layered over the built-in catalog.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub risk: BTreeMap<String, RiskTier>,
}

impl WardenConfig {
    /// Configuration rooted at `dir` with every other setting defaulted.
    pub fn from_data_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(dir.into()),
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Replace the data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(dir.into());
        self
    }

    /// `<platform data dir>/warden`, or `./warden` when the platform has none.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("warden")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .as_deref()
            .map(expand)
            .unwrap_or_else(Self::default_data_dir)
    }

    pub fn policy_path(&self) -> PathBuf {
        self.resolve(self.policy_file.as_deref(), POLICY_FILE_NAME)
    }

    pub fn audit_path(&self) -> PathBuf {
        self.resolve(self.audit_log.as_deref(), AUDIT_LOG_NAME)
    }

    /// The built-in risk catalog with this configuration's overrides applied.
    pub fn risk_catalog(&self) -> RiskCatalog {
        RiskCatalog::default().with_tiers(self.risk.iter().map(|(tool, tier)| (tool.clone(), *tier)))
    }

    fn resolve(&self, configured: Option<&Path>, default_name: &str) -> PathBuf {
        match configured.map(expand) {
            Some(path) if path.is_absolute() => path,
            Some(path) => self.data_dir().join(path),
            None => self.data_dir().join(default_name),
        }
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&path_str).as_ref())
}
