// roundseq - GPL-3.0-or-later
// This file is part of roundseq.
//
// Copyright (C) 2025 Daniel Freiermuth
//
// roundseq is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// roundseq is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with roundseq.  If not, see <https://www.gnu.org/licenses/>.

use crate::error::{Result, RoundSeqError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Message prefix that opens a new consensus round
pub const DEFAULT_ROUND_MARKER: &str = "LedgerConsensus:NFO Entering consensus process";

/// Pipeline configuration, usually read from `config.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Literal prefix the date field of a protocol line starts with
    pub date_prefix: String,

    pub round_marker: String,

    /// Message categories dropped once a round is open
    pub ignored_prefixes: Vec<String>,

    /// When non-empty, only lines whose `Origin:LEVEL` origin is listed survive
    pub kept_origins: Vec<String>,

    /// Origins whose lines are always dropped
    pub dropped_origins: Vec<String>,

    pub placeholders: Placeholders,

    /// User rules applied after the built-in ones, in order
    pub extra_rules: Vec<RuleConfig>,

    /// Template -> mnemonic label, used by the labeled export
    pub labels: BTreeMap<String, String>,

    /// `None` lets the binary decide from terminal attachment
    pub echo_canonical_lines: Option<bool>,

    /// Stop reading once this many rounds have been opened
    pub max_rounds: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            date_prefix: "2020".to_string(),
            round_marker: DEFAULT_ROUND_MARKER.to_string(),
            ignored_prefixes: vec!["Application:NFO".to_string(), "Peer:".to_string()],
            kept_origins: Vec::new(),
            dropped_origins: Vec::new(),
            placeholders: Placeholders::default(),
            extra_rules: Vec::new(),
            labels: BTreeMap::new(),
            echo_canonical_lines: None,
            max_rounds: None,
        }
    }
}

/// Replacement text of the four built-in canonicalization rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placeholders {
    pub hash64: String,
    pub id52: String,
    pub ip: String,
    pub num: String,
}

impl Default for Placeholders {
    fn default() -> Self {
        Self {
            hash64: "some-base-16-hash".to_string(),
            id52: "some-id".to_string(),
            ip: "some-ip".to_string(),
            num: "#some-num".to_string(),
        }
    }
}

/// A user supplied substitution rule. `replacement` may reference capture
/// groups as `$1` or `${name}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub name: String,
    pub pattern: String,
    pub replacement: String,
}

impl PipelineConfig {
    /// Get the path to the per-user config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("roundseq").join("config.json"))
    }

    /// Load an explicitly requested config file. Any failure is fatal.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|source| RoundSeqError::io(path, source))?;
        let config = serde_json::from_str::<Self>(&contents).map_err(|source| {
            RoundSeqError::Config {
                path: path.to_path_buf(),
                source,
            }
        })?;
        tracing::info!(
            "Loaded config from {path:?} ({} ignored prefixes, {} extra rules, {} labels)",
            config.ignored_prefixes.len(),
            config.extra_rules.len(),
            config.labels.len()
        );
        Ok(config)
    }

    /// Load the per-user config, returning defaults if it is missing or broken
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            tracing::info!("No config found at {path:?}, using defaults");
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config: {e}");
                Self::default()
            }
        }
    }

    /// Save config as pretty JSON, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|source| RoundSeqError::io(parent, source))?;
            }
        }

        let json = serde_json::to_string_pretty(self).map_err(|source| RoundSeqError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| RoundSeqError::io(path, source))?;

        tracing::info!("Saved config to {path:?}");
        Ok(())
    }
}
