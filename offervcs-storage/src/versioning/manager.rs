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


//! Repository Manager
//!
//! Public entry point for repository lifecycle operations. One
//! `parking_lot::RwLock` guards the whole graph store. Every mutation runs
//! the same sequence under the write lock:
//!
//! 1. clone the target repository (commits are `Arc`-shared)
//! 2. mutate the staged copy
//! 3. persist the staged copy
//! 4. install it into the store
//!
//! A persistence error returns before step 4, so the visible store never
//! runs ahead of durable state. Audit logging and events run after the lock
//! is released and are best-effort.

use super::ancestry::{self, first_parent_walk};
use super::diff::DiffEngine;
use super::graph::{GraphStore, Repository};
use super::ids::{commit_id, repository_id, Clock, CommitId, SystemClock};
use super::merge::{MergeEngine, MergeRecord};
use super::objects::{Change, Commit};
use super::refs::{validate_ref_name, Branch, Tag};
use crate::persistence::PersistenceBackend;
use offervcs_core::audit::{
    AuditLogger, EventSink, RepositoryEvent, TracingAuditLogger, ACTION_BRANCH_CREATED,
    ACTION_BRANCH_MERGED, ACTION_OFFER_COMMITTED, ACTION_REPOSITORY_CREATED,
    ACTION_REPOSITORY_LOADED, ACTION_TAG_CREATED,
};
use offervcs_core::{validate_record, OfferRecord, VcsConfig, VcsError, VcsResult};
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// Actor recorded for operations not initiated by a user
const SYSTEM_ACTOR: &str = "system";

/// Audit entry and event produced by a successful mutation
struct Notice {
    action: &'static str,
    actor: String,
    details: Value,
    event: RepositoryEvent,
}

/// Thread-safe facade over the commit graph store
pub struct RepositoryManager {
    store: RwLock<GraphStore>,
    backend: Arc<dyn PersistenceBackend>,
    audit: Arc<dyn AuditLogger>,
    events: Option<Arc<dyn EventSink>>,
    clock: Arc<dyn Clock>,
    config: VcsConfig,
    diff: DiffEngine,
    merger: MergeEngine,
}

impl RepositoryManager {
    /// Manager with default configuration, tracing audit log, and system clock
    pub fn new(backend: Arc<dyn PersistenceBackend>) -> Self {
        Self::with_config(backend, VcsConfig::default())
    }

    pub fn with_config(backend: Arc<dyn PersistenceBackend>, config: VcsConfig) -> Self {
        let diff = DiffEngine::with_config(config.impact.clone());
        let merger = MergeEngine::new(diff.clone(), config.validation.clone());
        Self {
            store: RwLock::new(GraphStore::new()),
            backend,
            audit: Arc::new(TracingAuditLogger),
            events: None,
            clock: Arc::new(SystemClock),
            config,
            diff,
            merger,
        }
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &VcsConfig {
        &self.config
    }

    // === Mutations ===

    /// Create an empty repository with an unborn default branch
    pub fn init_repository(
        &self,
        name: &str,
        description: &str,
        owner: &str,
    ) -> VcsResult<Repository> {
        let repo = {
            let mut store = self.store.write();
            let created_at = store.next_timestamp(self.clock.now());
            let id = repository_id(name, created_at);
            if store.contains(&id) {
                return Err(VcsError::RepositoryExists(id));
            }

            let repo = Repository::new(
                id,
                name,
                description,
                owner,
                &self.config.default_branch,
                created_at,
            );
            self.persist(&repo)?;
            store.install(repo.clone());
            repo
        };

        info!(repo_id = %repo.id, name, owner, "Repository initialized");
        self.notify(Notice {
            action: ACTION_REPOSITORY_CREATED,
            actor: owner.to_string(),
            details: json!({
                "repo_id": repo.id,
                "repo_name": name,
                "description": description,
            }),
            event: RepositoryEvent::RepositoryCreated {
                repo_id: repo.id.clone(),
            },
        });
        Ok(repo)
    }

    /// Commit a new record revision on `branch`
    ///
    /// Invalid records are rejected with every violation listed; nothing is
    /// created in that case.
    pub fn commit(
        &self,
        repo_id: &str,
        branch: &str,
        message: &str,
        author: &str,
        record: OfferRecord,
    ) -> VcsResult<Arc<Commit>> {
        let commit = {
            let mut store = self.store.write();
            let mut staged = store.get(repo_id)?.clone();
            let parent = staged.branch(branch)?.head;

            let validation = validate_record(&record, &self.config.validation);
            if !validation.is_valid {
                warn!(repo_id, branch, errors = %validation, "Rejected invalid record");
                return Err(VcsError::Validation(validation));
            }

            let changes = match parent {
                Some(id) => {
                    let parent = staged
                        .get_commit(&id)
                        .ok_or_else(|| VcsError::CommitNotFound(id.to_hex()))?;
                    self.diff.diff_records(&parent.record, &record)
                }
                None => Vec::new(),
            };

            let timestamp = store.next_timestamp(self.clock.now());
            let commit = staged.insert_commit(Commit {
                id: commit_id(repo_id, branch, message, author, &record, timestamp)?,
                message: message.to_string(),
                author: author.to_string(),
                timestamp,
                parent,
                merge_parents: Vec::new(),
                record,
                changes,
                is_valid: validation.is_valid,
                validation,
            })?;

            staged.branch_mut(branch)?.head = Some(commit.id);
            staged.head = Some(commit.id);
            staged.updated_at = timestamp;

            self.persist(&staged)?;
            store.install(staged);
            commit
        };

        info!(
            repo_id,
            branch,
            commit = %commit.id,
            author,
            changes = commit.changes.len(),
            "Offer committed"
        );
        self.notify(Notice {
            action: ACTION_OFFER_COMMITTED,
            actor: author.to_string(),
            details: json!({
                "repo_id": repo_id,
                "branch": branch,
                "commit_hash": commit.id.to_hex(),
                "message": message,
                "changes": commit.changes.len(),
            }),
            event: RepositoryEvent::Committed {
                repo_id: repo_id.to_string(),
                branch: branch.to_string(),
                commit: commit.id.to_hex(),
            },
        });
        Ok(commit)
    }

    /// Create a working branch at `from` (any revision), or at the repository head
    pub fn create_branch(
        &self,
        repo_id: &str,
        name: &str,
        from: Option<&str>,
        author: &str,
    ) -> VcsResult<Branch> {
        validate_ref_name(name)?;

        let branch = {
            let mut store = self.store.write();
            let mut staged = store.get(repo_id)?.clone();
            if staged.branches.contains_key(name) {
                return Err(VcsError::BranchExists(name.to_string()));
            }

            let head = resolve_or_head(&staged, from)?;
            let created_at = store.next_timestamp(self.clock.now());
            let branch = Branch::working(name, head, author, created_at);
            staged.branches.insert(name.to_string(), branch.clone());
            staged.updated_at = created_at;

            self.persist(&staged)?;
            store.install(staged);
            branch
        };

        let head = branch.head.map(|h| h.to_hex()).unwrap_or_default();
        info!(repo_id, branch = name, from = %head, author, "Branch created");
        self.notify(Notice {
            action: ACTION_BRANCH_CREATED,
            actor: author.to_string(),
            details: json!({
                "repo_id": repo_id,
                "branch_name": name,
                "from_commit": head,
            }),
            event: RepositoryEvent::BranchCreated {
                repo_id: repo_id.to_string(),
                branch: name.to_string(),
                head,
            },
        });
        Ok(branch)
    }

    /// Tag `commit` (any revision), or the repository head
    pub fn create_tag(
        &self,
        repo_id: &str,
        name: &str,
        commit: Option<&str>,
        message: &str,
        author: &str,
        is_release: bool,
    ) -> VcsResult<Tag> {
        self.insert_tag(repo_id, name, commit, message, author, is_release, None)
    }

    /// Tag a release with notes
    pub fn create_release(
        &self,
        repo_id: &str,
        name: &str,
        commit: Option<&str>,
        message: &str,
        author: &str,
        release_notes: &str,
    ) -> VcsResult<Tag> {
        self.insert_tag(
            repo_id,
            name,
            commit,
            message,
            author,
            true,
            Some(release_notes.to_string()),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn insert_tag(
        &self,
        repo_id: &str,
        name: &str,
        commit: Option<&str>,
        message: &str,
        author: &str,
        is_release: bool,
        release_notes: Option<String>,
    ) -> VcsResult<Tag> {
        validate_ref_name(name)?;

        let tag = {
            let mut store = self.store.write();
            let mut staged = store.get(repo_id)?.clone();
            if staged.tags.contains_key(name) {
                return Err(VcsError::TagExists(name.to_string()));
            }

            let target = resolve_or_head(&staged, commit)?;
            let created_at = store.next_timestamp(self.clock.now());
            let tag = Tag {
                name: name.to_string(),
                commit: target,
                message: message.to_string(),
                created_at,
                created_by: author.to_string(),
                is_release,
                release_notes,
            };
            staged.tags.insert(name.to_string(), tag.clone());
            staged.updated_at = created_at;

            self.persist(&staged)?;
            store.install(staged);
            tag
        };

        info!(repo_id, tag = name, commit = %tag.commit, author, "Tag created");
        self.notify(Notice {
            action: ACTION_TAG_CREATED,
            actor: author.to_string(),
            details: json!({
                "repo_id": repo_id,
                "tag_name": name,
                "commit": tag.commit.to_hex(),
                "is_release": is_release,
            }),
            event: RepositoryEvent::TagCreated {
                repo_id: repo_id.to_string(),
                tag: name.to_string(),
                commit: tag.commit.to_hex(),
            },
        });
        Ok(tag)
    }

    /// Merge `source` into `target`
    ///
    /// Conflicts are not an error: the returned record carries them with
    /// status `conflicted`, and no branch moves.
    pub fn merge(
        &self,
        repo_id: &str,
        source: &str,
        target: &str,
        author: &str,
    ) -> VcsResult<MergeRecord> {
        let record = {
            let mut store = self.store.write();
            let mut staged = store.get(repo_id)?.clone();
            let timestamp = store.next_timestamp(self.clock.now());

            let record = self
                .merger
                .merge(&mut staged, source, target, author, timestamp)?;

            self.persist(&staged)?;
            store.install(staged);
            record
        };

        info!(
            repo_id,
            from = source,
            to = target,
            merge_id = %record.id,
            status = %record.status,
            fast_forward = record.fast_forward,
            conflicts = record.conflicts.len(),
            "Branch merge attempted"
        );
        self.notify(Notice {
            action: ACTION_BRANCH_MERGED,
            actor: author.to_string(),
            details: json!({
                "repo_id": repo_id,
                "from_branch": source,
                "to_branch": target,
                "merge_id": record.id,
                "status": record.status,
            }),
            event: RepositoryEvent::Merged {
                repo_id: repo_id.to_string(),
                source: source.to_string(),
                target: target.to_string(),
                merge_id: record.id.clone(),
                status: record.status.to_string(),
            },
        });
        Ok(record)
    }

    /// Rehydrate a repository from its persisted snapshot
    pub fn load_repository(&self, repo_id: &str) -> VcsResult<Repository> {
        let repo = {
            let mut store = self.store.write();
            if store.contains(repo_id) {
                return Err(VcsError::RepositoryExists(repo_id.to_string()));
            }

            let bytes = self
                .backend
                .get(&self.config.repository_key(repo_id))?
                .ok_or_else(|| VcsError::RepositoryNotFound(repo_id.to_string()))?;
            let repo = Repository::from_json(&bytes)?;
            if repo.id != repo_id {
                return Err(VcsError::Persistence(format!(
                    "snapshot for {} holds repository {}",
                    repo_id, repo.id
                )));
            }

            store.install(repo.clone());
            repo
        };

        info!(repo_id, commits = repo.commit_count(), "Repository loaded");
        self.notify(Notice {
            action: ACTION_REPOSITORY_LOADED,
            actor: SYSTEM_ACTOR.to_string(),
            details: json!({
                "repo_id": repo_id,
                "commits": repo.commit_count(),
            }),
            event: RepositoryEvent::RepositoryLoaded {
                repo_id: repo_id.to_string(),
            },
        });
        Ok(repo)
    }

    // === Reads ===

    /// Primary-parent history of `branch`, newest first (`limit == 0` is unbounded)
    pub fn get_commit_history(
        &self,
        repo_id: &str,
        branch: &str,
        limit: usize,
    ) -> VcsResult<Vec<Arc<Commit>>> {
        let store = self.store.read();
        let repo = store.get(repo_id)?;
        let Some(head) = repo.branch(branch)?.head else {
            return Ok(Vec::new());
        };

        let limit = if limit == 0 { usize::MAX } else { limit };
        Ok(first_parent_walk(repo, head).take(limit).cloned().collect())
    }

    /// Field changes from revision `from` to revision `to`
    pub fn get_diff(&self, repo_id: &str, from: &str, to: &str) -> VcsResult<Vec<Change>> {
        let store = self.store.read();
        let repo = store.get(repo_id)?;
        let old = lookup(repo, from)?;
        let new = lookup(repo, to)?;
        Ok(self.diff.diff_records(&old.record, &new.record))
    }

    pub fn get_repository(&self, repo_id: &str) -> VcsResult<Repository> {
        Ok(self.store.read().get(repo_id)?.clone())
    }

    /// Ids of all loaded repositories, sorted
    pub fn list_repositories(&self) -> Vec<String> {
        self.store.read().repository_ids()
    }

    pub fn get_commit(&self, repo_id: &str, rev: &str) -> VcsResult<Arc<Commit>> {
        let store = self.store.read();
        lookup(store.get(repo_id)?, rev)
    }

    pub fn list_branches(&self, repo_id: &str) -> VcsResult<Vec<Branch>> {
        let store = self.store.read();
        Ok(store.get(repo_id)?.branches.values().cloned().collect())
    }

    pub fn list_tags(&self, repo_id: &str) -> VcsResult<Vec<Tag>> {
        let store = self.store.read();
        Ok(store.get(repo_id)?.tags.values().cloned().collect())
    }

    pub fn get_tag(&self, repo_id: &str, name: &str) -> VcsResult<Tag> {
        let store = self.store.read();
        Ok(store.get(repo_id)?.tag(name)?.clone())
    }

    /// Every merge attempt on the repository, oldest first
    pub fn merge_history(&self, repo_id: &str) -> VcsResult<Vec<MergeRecord>> {
        let store = self.store.read();
        Ok(store.get(repo_id)?.merges().to_vec())
    }

    /// Resolve a branch, tag, full commit id, or unique id prefix
    pub fn resolve(&self, repo_id: &str, rev: &str) -> VcsResult<CommitId> {
        self.store.read().get(repo_id)?.resolve(rev)
    }

    /// True if `ancestor` is on the primary-parent chain of `descendant`
    pub fn is_ancestor(&self, repo_id: &str, ancestor: &str, descendant: &str) -> VcsResult<bool> {
        let store = self.store.read();
        let repo = store.get(repo_id)?;
        let ancestor = repo.resolve(ancestor)?;
        let descendant = repo.resolve(descendant)?;
        Ok(ancestry::is_ancestor(repo, &ancestor, &descendant))
    }

    // === Internals ===

    fn persist(&self, repo: &Repository) -> VcsResult<()> {
        let bytes = repo.to_json()?;
        self.backend
            .set(&self.config.repository_key(&repo.id), &bytes)?;
        Ok(())
    }

    fn notify(&self, notice: Notice) {
        if let Err(e) = self
            .audit
            .log_action(notice.action, &notice.actor, &notice.details)
        {
            warn!(action = notice.action, error = %e, "Audit logging failed");
        }

        if let Some(events) = &self.events {
            if let Err(e) = events.publish(&notice.event) {
                warn!(
                    repo_id = notice.event.repo_id(),
                    error = %e,
                    "Event publish failed"
                );
            }
        }
    }
}

fn resolve_or_head(repo: &Repository, rev: Option<&str>) -> VcsResult<CommitId> {
    match rev {
        Some(rev) => repo.resolve(rev),
        None => repo
            .head
            .ok_or_else(|| VcsError::CommitNotFound("HEAD".to_string())),
    }
}

fn lookup(repo: &Repository, rev: &str) -> VcsResult<Arc<Commit>> {
    let id = repo.resolve(rev)?;
    repo.get_commit(&id)
        .cloned()
        .ok_or_else(|| VcsError::CommitNotFound(rev.to_string()))
}
