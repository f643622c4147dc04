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

//! Commit and Change Types
//!
//! All commits are immutable once created.

use super::ids::CommitId;
use chrono::{DateTime, Utc};
use offervcs_core::{ImpactLevel, OfferRecord, ValidationResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Kind of field-level delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Modified,
    Removed,
}

/// One field-level delta between two record snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Change {
    #[serde(rename = "type")]
    pub change_type: ChangeType,
    /// Structural path, e.g. `offer.price`
    pub path: String,
    pub field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
    pub description: String,
    pub impact: ImpactLevel,
}

/// Commit - versioned record snapshot with parent chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub id: CommitId,
    pub message: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    /// Primary parent - none for root commits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<CommitId>,
    /// Additional parents (merge commits only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merge_parents: Vec<CommitId>,
    /// Full record at this revision
    pub record: OfferRecord,
    /// Changes versus the primary parent
    pub changes: Vec<Change>,
    pub is_valid: bool,
    pub validation: ValidationResult,
}

impl Commit {
    /// All parents, primary first
    pub fn parents(&self) -> impl Iterator<Item = CommitId> + '_ {
        self.parent.into_iter().chain(self.merge_parents.iter().copied())
    }

    /// Check if this is a root commit
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Check if this is a merge commit
    pub fn is_merge(&self) -> bool {
        !self.merge_parents.is_empty()
    }
}
