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


//! Merge Engine - Fast-Forward and Three-Way Merges
//!
//! A merge attempt moves from `Pending` to exactly one terminal state:
//!
//! ```text
//!                 ┌─> Completed   (fast-forward, or clean three-way)
//!   Pending ──────┼─> Conflicted  (no commit, no head moves)
//!                 └─> Failed      (no common ancestor)
//! ```
//!
//! The engine mutates a staged [`Repository`]; the caller decides whether the
//! staged copy becomes visible.

use super::ancestry::{find_common_ancestor, is_ancestor};
use super::diff::{field_path, values_equal, DiffEngine};
use super::graph::Repository;
use super::ids::{commit_id, merge_id, CommitId};
use super::objects::Commit;
use chrono::{DateTime, Utc};
use offervcs_core::{validate_record, OfferRecord, ValidationConfig, VcsError, VcsResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// Lifecycle of a merge attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStatus {
    Pending,
    Completed,
    Conflicted,
    Failed,
}

impl MergeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStatus::Pending => "pending",
            MergeStatus::Completed => "completed",
            MergeStatus::Conflicted => "conflicted",
            MergeStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, MergeStatus::Pending)
    }
}

impl fmt::Display for MergeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field both branches changed differently since their common ancestor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub path: String,
    pub field: String,
    /// Value at the common ancestor
    pub base_value: Option<Value>,
    /// Value on the source branch
    pub branch_value: Option<Value>,
    /// Value on the target branch
    pub target_value: Option<Value>,
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Value>,
}

impl Conflict {
    /// Record a caller-supplied resolution
    pub fn resolve(&mut self, value: Value) {
        self.resolution = Some(value);
        self.resolved = true;
    }
}

/// One merge attempt, as kept in the repository's merge history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeRecord {
    pub id: String,
    pub source_branch: String,
    pub target_branch: String,
    /// Commit the target branch points to afterwards, if it moved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit: Option<CommitId>,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<Conflict>,
    pub status: MergeStatus,
    #[serde(default)]
    pub fast_forward: bool,
}

impl MergeRecord {
    fn pending(repo_id: &str, source: &str, target: &str, author: &str, ts: DateTime<Utc>) -> Self {
        Self {
            id: merge_id(repo_id, source, target, author, ts),
            source_branch: source.to_string(),
            target_branch: target.to_string(),
            commit: None,
            author: author.to_string(),
            timestamp: ts,
            conflicts: Vec::new(),
            status: MergeStatus::Pending,
            fast_forward: false,
        }
    }

    pub fn is_conflicted(&self) -> bool {
        self.status == MergeStatus::Conflicted
    }
}

/// Result of a per-field three-way merge
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMerge {
    pub record: OfferRecord,
    pub conflicts: Vec<Conflict>,
}

/// Merge `source` and `target` field by field against their ancestor `base`
pub fn three_way_merge(base: &OfferRecord, source: &OfferRecord, target: &OfferRecord) -> FieldMerge {
    let fields: BTreeSet<&str> = base
        .field_names()
        .chain(source.field_names())
        .chain(target.field_names())
        .collect();

    let mut record = OfferRecord::default();
    let mut conflicts = Vec::new();

    for field in fields {
        let (b, s, t) = (base.get(field), source.get(field), target.get(field));

        let merged = if values_equal(s, t) || values_equal(s, b) {
            t
        } else if values_equal(t, b) {
            s
        } else {
            conflicts.push(Conflict {
                path: field_path(field),
                field: field.to_string(),
                base_value: b.cloned(),
                branch_value: s.cloned(),
                target_value: t.cloned(),
                resolved: false,
                resolution: None,
            });
            continue;
        };

        if let Some(value) = merged {
            record.set(field, value.clone());
        }
    }

    FieldMerge { record, conflicts }
}

/// Orchestrates merges between two branches of one repository
#[derive(Debug, Clone, Default)]
pub struct MergeEngine {
    diff: DiffEngine,
    validation: ValidationConfig,
}

impl MergeEngine {
    pub fn new(diff: DiffEngine, validation: ValidationConfig) -> Self {
        Self { diff, validation }
    }

    /// Merge `source` into `target` on a staged repository
    ///
    /// Appends exactly one [`MergeRecord`] to the repository's merge history
    /// and returns a copy of it. Errors (unknown branch, empty source) leave
    /// the repository untouched.
    pub fn merge(
        &self,
        repo: &mut Repository,
        source: &str,
        target: &str,
        author: &str,
        timestamp: DateTime<Utc>,
    ) -> VcsResult<MergeRecord> {
        let source_head = repo
            .branch(source)?
            .head
            .ok_or_else(|| VcsError::EmptyBranch(source.to_string()))?;
        let target_head = repo.branch(target)?.head;

        let mut record = MergeRecord::pending(&repo.id, source, target, author, timestamp);

        match target_head {
            Some(t) if !is_ancestor(repo, &t, &source_head) => {
                self.three_way(repo, &mut record, source_head, t)?;
            }
            _ => {
                debug!(
                    repo_id = %repo.id,
                    source,
                    target,
                    head = %source_head,
                    "Fast-forward merge"
                );
                repo.branch_mut(target)?.head = Some(source_head);
                record.commit = Some(source_head);
                record.fast_forward = true;
                record.status = MergeStatus::Completed;
            }
        }

        repo.updated_at = timestamp;
        repo.push_merge(record.clone());
        Ok(record)
    }

    fn three_way(
        &self,
        repo: &mut Repository,
        record: &mut MergeRecord,
        source_head: CommitId,
        target_head: CommitId,
    ) -> VcsResult<()> {
        let Some(base) = find_common_ancestor(repo, source_head, target_head) else {
            debug!(repo_id = %repo.id, "No common ancestor, merge failed");
            record.status = MergeStatus::Failed;
            return Ok(());
        };

        let lookup = |id: CommitId| {
            repo.get_commit(&id)
                .cloned()
                .ok_or_else(|| VcsError::CommitNotFound(id.to_hex()))
        };
        let source_commit = lookup(source_head)?;
        let target_commit = lookup(target_head)?;

        let outcome = three_way_merge(&base.record, &source_commit.record, &target_commit.record);

        if !outcome.conflicts.is_empty() {
            debug!(
                repo_id = %repo.id,
                base = %base.id,
                conflicts = outcome.conflicts.len(),
                "Three-way merge conflicted"
            );
            record.conflicts = outcome.conflicts;
            record.status = MergeStatus::Conflicted;
            return Ok(());
        }

        let message = format!(
            "Merge branch '{}' into '{}'",
            record.source_branch, record.target_branch
        );
        let validation = validate_record(&outcome.record, &self.validation);
        let commit = Commit {
            id: commit_id(
                &repo.id,
                &record.target_branch,
                &message,
                &record.author,
                &outcome.record,
                record.timestamp,
            )?,
            message,
            author: record.author.clone(),
            timestamp: record.timestamp,
            parent: Some(target_head),
            merge_parents: vec![source_head],
            changes: self.diff.diff_records(&target_commit.record, &outcome.record),
            is_valid: validation.is_valid,
            validation,
            record: outcome.record,
        };

        let commit = repo.insert_commit(commit)?;
        repo.branch_mut(&record.target_branch)?.head = Some(commit.id);
        repo.head = Some(commit.id);

        debug!(
            repo_id = %repo.id,
            base = %base.id,
            commit = %commit.id,
            "Three-way merge committed"
        );
        record.commit = Some(commit.id);
        record.status = MergeStatus::Completed;
        Ok(())
    }
}
