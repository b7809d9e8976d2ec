//! Settings for the checking layer
//!
//! Settings can come from a TOML document or from the process environment.
//! Applying them sets the process-wide deep checking flag. A TOML document may
//! also declare named bounds that hosts look up at decoration time.
//!
//! ```toml
//! deep = true
//!
//! [bounds.percent]
//! low = 0
//! high = 100
//!
//! [[bounds.outside_unit]]
//! low = -inf
//! high = 0
//! include_high = false
//!
//! [[bounds.outside_unit]]
//! low = 1
//! high = inf
//! include_low = false
//! ```

use crate::bounds::{BoundChecker, BoundSpec};
use crate::error::{CheckError, Result};
use crate::types::set_deep;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Environment variable holding the deep checking flag
pub const DEEP_ENV_VAR: &str = "RUNTIME_CHECK_DEEP";

/// Checking settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckSettings {
    /// Check container elements, not just container categories
    pub deep: bool,
    /// Host-defined bounds, by name
    pub bounds: BTreeMap<String, BoundSpec>,
}

impl CheckSettings {
    /// Parse settings from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CheckError::configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through a variable lookup function
    pub fn from_lookup<L>(lookup: L) -> Result<Self>
    where
        L: Fn(&str) -> Option<String>,
    {
        let deep = match lookup(DEEP_ENV_VAR) {
            Some(raw) => parse_flag(&raw).ok_or_else(|| {
                CheckError::configuration(format!(
                    "{} must be a boolean flag, got '{}'",
                    DEEP_ENV_VAR, raw
                ))
            })?,
            None => false,
        };
        Ok(Self {
            deep,
            ..Self::default()
        })
    }

    /// Checker for a named bound declared in these settings
    pub fn bound(&self, name: &str) -> Option<BoundChecker> {
        self.bounds.get(name).cloned().map(BoundChecker::new)
    }

    /// Make these settings the process-wide behaviour
    pub fn apply(&self) {
        set_deep(self.deep);
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
