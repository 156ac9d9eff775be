//! Engine configuration
//!
//! Supplied once at startup. Durations are stored as milliseconds so the
//! JSON form stays flat.

use std::path::Path;
use std::time::Duration;

use dom::DEFAULT_TAG_BLACKLIST;
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Wait before the first snapshot of a mutation-triggered scan
    pub quiescence_delay_ms: u64,
    /// Wait between the two snapshots
    pub comparison_window_ms: u64,
    /// Element categories cut out of every snapshot
    pub tag_blacklist: Vec<String>,
    /// Prefix shared by every class the engine writes
    pub class_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quiescence_delay_ms: 2000,
            comparison_window_ms: 1536,
            tag_blacklist: DEFAULT_TAG_BLACKLIST.iter().map(|s| s.to_string()).collect(),
            class_prefix: "d_".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn quiescence_delay(&self) -> Duration {
        Duration::from_millis(self.quiescence_delay_ms)
    }

    pub fn comparison_window(&self) -> Duration {
        Duration::from_millis(self.comparison_window_ms)
    }

    pub fn markers(&self) -> Markers {
        Markers::new(&self.class_prefix)
    }
}

/// Class names written onto the live tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    prefix: String,
    detected: String,
    current: String,
}

impl Markers {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            detected: format!("{prefix}pattern-detected"),
            current: format!("{prefix}current-pattern"),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Generic "some pattern matched here" marker
    pub fn detected(&self) -> &str {
        &self.detected
    }

    /// Marker of the highlight overlay
    pub fn current(&self) -> &str {
        &self.current
    }

    /// Pattern-specific marker
    pub fn pattern(&self, class_key: &str) -> String {
        format!("{}{}", self.prefix, class_key)
    }
}
