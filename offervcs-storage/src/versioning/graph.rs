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

//! Commit Graph Store
//!
//! Repositories own an append-only arena of commits keyed by id. Parent
//! links are plain ids, so traversal is map lookup rather than pointer
//! chasing. Commits are `Arc`-shared, which keeps cloning a repository
//! (to stage a mutation) proportional to its pointer count, not its data.

use super::ids::CommitId;
use super::merge::MergeRecord;
use super::objects::Commit;
use super::refs::{Branch, Tag};
use chrono::{DateTime, Duration, Utc};
use offervcs_core::{VcsError, VcsResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Minimum hex prefix length accepted when resolving commit ids
pub const MIN_PREFIX_LEN: usize = 7;

/// Who may read the repository (carried for callers)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Public,
    #[default]
    Private,
    Team,
}

/// A named collection of commits with branches, tags, and merge history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Most recently created commit
    pub head: Option<CommitId>,
    pub branches: BTreeMap<String, Branch>,
    pub tags: BTreeMap<String, Tag>,
    /// Insertion ordered
    commits: Vec<Arc<Commit>>,
    merges: Vec<MergeRecord>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub owner: String,
    pub access: AccessLevel,
    pub contributors: Vec<String>,
    pub watchers: Vec<String>,

    #[serde(skip)]
    index: HashMap<CommitId, usize>,
}

impl Repository {
    /// Create an empty repository with an unborn default branch
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        owner: impl Into<String>,
        default_branch: &str,
        created_at: DateTime<Utc>,
    ) -> Self {
        let owner = owner.into();
        let mut branches = BTreeMap::new();
        branches.insert(
            default_branch.to_string(),
            Branch::default_line(default_branch, owner.clone(), created_at),
        );

        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            head: None,
            branches,
            tags: BTreeMap::new(),
            commits: Vec::new(),
            merges: Vec::new(),
            created_at,
            updated_at: created_at,
            created_by: owner.clone(),
            owner: owner.clone(),
            access: AccessLevel::Private,
            contributors: vec![owner.clone()],
            watchers: vec![owner],
            index: HashMap::new(),
        }
    }

    /// Decode a persisted snapshot and rebuild the commit index
    pub fn from_json(bytes: &[u8]) -> VcsResult<Self> {
        let mut repo: Repository = serde_json::from_slice(bytes)?;
        repo.reindex();
        repo.check_integrity()?;
        Ok(repo)
    }

    pub fn to_json(&self) -> VcsResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    fn reindex(&mut self) {
        self.index = self
            .commits
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id, i))
            .collect();
    }

    /// Every head, tag, and parent must reference a known commit
    pub fn check_integrity(&self) -> VcsResult<()> {
        let dangling = |id: &CommitId| VcsError::CommitNotFound(id.to_hex());

        for commit in &self.commits {
            for parent in commit.parents() {
                if !self.contains(&parent) {
                    return Err(dangling(&parent));
                }
            }
        }
        let heads = self.branches.values().filter_map(|b| b.head.as_ref());
        let tags = self.tags.values().map(|t| &t.commit);
        for id in heads.chain(tags).chain(self.head.as_ref()) {
            if !self.contains(id) {
                return Err(dangling(id));
            }
        }
        Ok(())
    }

    pub fn get_commit(&self, id: &CommitId) -> Option<&Arc<Commit>> {
        self.index.get(id).map(|&i| &self.commits[i])
    }

    pub fn contains(&self, id: &CommitId) -> bool {
        self.index.contains_key(id)
    }

    /// Append a commit; its parents must already be present
    pub fn insert_commit(&mut self, commit: Commit) -> VcsResult<Arc<Commit>> {
        if self.contains(&commit.id) {
            return Err(VcsError::CommitExists(commit.id.to_hex()));
        }
        if let Some(missing) = commit.parents().find(|p| !self.contains(p)) {
            return Err(VcsError::CommitNotFound(missing.to_hex()));
        }

        let commit = Arc::new(commit);
        self.index.insert(commit.id, self.commits.len());
        self.commits.push(Arc::clone(&commit));
        Ok(commit)
    }

    /// Commits in creation order
    pub fn commits(&self) -> &[Arc<Commit>] {
        &self.commits
    }

    pub fn commit_count(&self) -> usize {
        self.commits.len()
    }

    pub fn merges(&self) -> &[MergeRecord] {
        &self.merges
    }

    pub fn push_merge(&mut self, record: MergeRecord) {
        self.merges.push(record);
    }

    pub fn branch(&self, name: &str) -> VcsResult<&Branch> {
        self.branches.get(name).ok_or_else(|| VcsError::BranchNotFound {
            repo_id: self.id.clone(),
            branch: name.to_string(),
        })
    }

    pub fn branch_mut(&mut self, name: &str) -> VcsResult<&mut Branch> {
        let repo_id = &self.id;
        self.branches
            .get_mut(name)
            .ok_or_else(|| VcsError::BranchNotFound {
                repo_id: repo_id.clone(),
                branch: name.to_string(),
            })
    }

    pub fn tag(&self, name: &str) -> VcsResult<&Tag> {
        self.tags.get(name).ok_or_else(|| VcsError::TagNotFound {
            repo_id: self.id.clone(),
            tag: name.to_string(),
        })
    }

    /// Resolve a branch name, tag name, full hex id, or unique hex prefix
    pub fn resolve(&self, rev: &str) -> VcsResult<CommitId> {
        if let Some(branch) = self.branches.get(rev) {
            return branch
                .head
                .ok_or_else(|| VcsError::EmptyBranch(rev.to_string()));
        }

        if let Some(tag) = self.tags.get(rev) {
            return Ok(tag.commit);
        }

        let not_found = || VcsError::CommitNotFound(rev.to_string());

        if rev.len() < MIN_PREFIX_LEN || !rev.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(not_found());
        }

        if let Ok(id) = CommitId::from_hex(rev) {
            return if self.contains(&id) { Ok(id) } else { Err(not_found()) };
        }

        let mut matches = self.commits.iter().filter(|c| c.id.starts_with(rev));
        match (matches.next(), matches.next()) {
            (Some(commit), None) => Ok(commit.id),
            _ => Err(not_found()),
        }
    }
}

/// All repositories of one hosting service
///
/// Constructed explicitly and owned by the repository manager.
#[derive(Debug, Default)]
pub struct GraphStore {
    repositories: HashMap<String, Repository>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, repo_id: &str) -> VcsResult<&Repository> {
        self.repositories
            .get(repo_id)
            .ok_or_else(|| VcsError::RepositoryNotFound(repo_id.to_string()))
    }

    pub fn contains(&self, repo_id: &str) -> bool {
        self.repositories.contains_key(repo_id)
    }

    /// Swap a staged repository into the visible store
    pub fn install(&mut self, repo: Repository) {
        self.repositories.insert(repo.id.clone(), repo);
    }

    pub fn repository_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.repositories.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    /// Next timestamp, strictly after every one handed out before
    ///
    /// Keeps commit ids unique even when the clock stalls or steps back.
    pub fn next_timestamp(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }
}
