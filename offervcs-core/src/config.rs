// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Configuration for the version control engine
//!
//! Every section has defaults, so an empty TOML document is a valid config.
//!
//! ```toml
//! default_branch = "main"
//! persistence_key_prefix = "offer_repos/"
//!
//! [validation]
//! price_fields = ["price", "base_fare"]
//!
//! [impact]
//! critical_pct = 25.0
//!
//! [impact.field_overrides]
//! currency = "critical"
//! ```

use crate::error::VcsResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Default name of the main line of development
pub const DEFAULT_BRANCH: &str = "main";

/// Default key prefix for persisted repository snapshots
pub const DEFAULT_KEY_PREFIX: &str = "offer_repos/";

/// Precision applied to percentage deltas before threshold comparison
const PCT_SCALE: f64 = 1e9;

/// Business impact of a field change
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Top-level engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VcsConfig {
    /// Branch created (protected, unborn) with every repository
    pub default_branch: String,

    /// Prefix prepended to the repository id to form the persistence key
    pub persistence_key_prefix: String,

    pub validation: ValidationConfig,

    pub impact: ImpactConfig,
}

impl Default for VcsConfig {
    fn default() -> Self {
        Self {
            default_branch: DEFAULT_BRANCH.to_string(),
            persistence_key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            validation: ValidationConfig::default(),
            impact: ImpactConfig::default(),
        }
    }
}

impl VcsConfig {
    /// Parse from a TOML document
    pub fn from_toml_str(s: &str) -> VcsResult<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> VcsResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Persistence key for a repository
    pub fn repository_key(&self, repo_id: &str) -> String {
        format!("{}{}", self.persistence_key_prefix, repo_id)
    }
}

/// Structural validation rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Numeric fields that must be strictly positive when present
    pub price_fields: Vec<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            price_fields: vec!["price".to_string()],
        }
    }
}

/// Impact classification thresholds
///
/// A numeric change is classified by its percentage delta against the old
/// value. Thresholds are exclusive: a delta of exactly `critical_pct` is
/// `High`, not `Critical`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactConfig {
    pub medium_pct: f64,
    pub high_pct: f64,
    pub critical_pct: f64,

    /// Fixed impact per field name, overriding the numeric rule and the
    /// low default for non-numeric fields
    pub field_overrides: HashMap<String, ImpactLevel>,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            medium_pct: 5.0,
            high_pct: 10.0,
            critical_pct: 20.0,
            field_overrides: HashMap::new(),
        }
    }
}

impl ImpactConfig {
    /// Classify an absolute percentage delta
    ///
    /// The delta is rounded to nine decimal places first, so float noise
    /// such as `20.000000000000004` grades the same as `20.0`.
    pub fn classify_pct(&self, pct: f64) -> ImpactLevel {
        let pct = (pct.abs() * PCT_SCALE).round() / PCT_SCALE;
        if pct > self.critical_pct {
            ImpactLevel::Critical
        } else if pct > self.high_pct {
            ImpactLevel::High
        } else if pct > self.medium_pct {
            ImpactLevel::Medium
        } else {
            ImpactLevel::Low
        }
    }

    pub fn override_for(&self, field: &str) -> Option<ImpactLevel> {
        self.field_overrides.get(field).copied()
    }
}
