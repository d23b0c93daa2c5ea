//! # Configuration & Constants
//!
//! Defaults shared by the codecs and the routing table, and the JSON
//! configuration document a node boots from.
//!
//! ## Loading
//!
//! A config file has to parse as a whole: an unreadable file or broken JSON
//! is fatal. Individual keys and routes inside it are applied one by one.
//! A bad entry is logged, recorded in the [`LoadReport`] and skipped; the
//! rest still load. One typo in a route should not take a node off the
//! network.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::crypto::{KeyPair, PublicKey};
use crate::network::{NodeId, Reachability, RoutingTable};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Crate version, reported by `chargemesh-node version`.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Priority of a reachability entry that does not state one. Lower wins.
pub const DEFAULT_PRIORITY: u8 = 0;

/// Weight of a reachability entry that does not state one.
pub const DEFAULT_WEIGHT: u8 = 1;

/// Environment variable the node reads its config path from.
pub const CONFIG_PATH_ENV: &str = "CHARGEMESH_CONFIG";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// The node configuration document.
///
/// Sections are kept as raw JSON until applied so that one malformed entry
/// cannot fail the whole document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(default)]
    pub keys: Vec<Value>,
    #[serde(default)]
    pub public_keys: Vec<Value>,
    #[serde(default)]
    pub routes: Vec<Value>,
}

/// A config entry that was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub section: &'static str,
    pub index: usize,
    pub reason: String,
}

/// Outcome of applying one config section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<SkippedEntry>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }

    fn skip(&mut self, section: &'static str, index: usize, reason: String) {
        warn!(section, index, %reason, "skipping config entry");
        self.skipped.push(SkippedEntry {
            section,
            index,
            reason,
        });
    }
}

impl OverlayConfig {
    /// Reads and parses `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&raw)?;
        info!(
            path = %path.display(),
            keys = config.keys.len(),
            public_keys = config.public_keys.len(),
            routes = config.routes.len(),
            "loaded config"
        );
        Ok(config)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Parses the `keys` section.
    pub fn load_keys(&self) -> (Vec<KeyPair>, LoadReport) {
        let mut report = LoadReport::default();
        let mut pairs = Vec::with_capacity(self.keys.len());
        for (index, value) in self.keys.iter().enumerate() {
            match KeyPair::from_json(value) {
                Ok(pair) => pairs.push(pair),
                Err(e) => report.skip("keys", index, e.to_string()),
            }
        }
        report.loaded = pairs.len();
        (pairs, report)
    }

    /// Parses the `publicKeys` section.
    pub fn load_public_keys(&self) -> (Vec<PublicKey>, LoadReport) {
        let mut report = LoadReport::default();
        let mut keys = Vec::with_capacity(self.public_keys.len());
        for (index, value) in self.public_keys.iter().enumerate() {
            match PublicKey::from_json(value) {
                Ok(key) => keys.push(key),
                Err(e) => report.skip("publicKeys", index, e.to_string()),
            }
        }
        report.loaded = keys.len();
        (keys, report)
    }

    /// Applies the `routes` section to `table`.
    pub fn load_routes(&self, table: &RoutingTable) -> LoadReport {
        let mut report = LoadReport::default();
        for (index, value) in self.routes.iter().enumerate() {
            match serde_json::from_value::<Reachability>(value.clone()) {
                Ok(entry) => {
                    table.add_or_update_static_routing(entry);
                    report.loaded += 1;
                }
                Err(e) => report.skip("routes", index, e.to_string()),
            }
        }
        report
    }
}
