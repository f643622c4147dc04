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


//! Integration tests for repository versioning workflows

use chrono::{TimeZone, Utc};
use offervcs_core::audit::{MemoryAuditLog, MemoryEventSink, RepositoryEvent, ACTION_TAG_CREATED};
use offervcs_core::{ErrorKind, ImpactLevel, OfferRecord, VcsConfig, VcsError};
use offervcs_storage::versioning::{apply_changes, FixedClock};
use offervcs_storage::{
    ChangeType, FsBackend, MemoryBackend, MergeStatus, PersistenceBackend, RepositoryManager,
};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn offer(price: u64) -> OfferRecord {
    OfferRecord::new("off1")
        .with("price", price)
        .with("description", "Lisbon saver")
}

fn manager() -> (RepositoryManager, Arc<MemoryBackend>) {
    init_tracing();
    let backend = Arc::new(MemoryBackend::new());
    (RepositoryManager::new(backend.clone()), backend)
}

/// Test first commit on a fresh repository
#[test]
fn test_initial_commit() {
    let (vcs, _) = manager();
    let repo = vcs.init_repository("pricing", "desc", "alice").unwrap();
    let commit = vcs
        .commit(&repo.id, "main", "initial", "alice", offer(100))
        .unwrap();

    assert!(commit.parent.is_none());
    assert!(commit.changes.is_empty());
    assert!(commit.is_valid);

    let history = vcs.get_commit_history(&repo.id, "main", 0).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, commit.id);
}

/// Test that exactly 20% is graded high, not critical
#[test]
fn test_second_commit_twenty_percent_is_high() {
    let (vcs, _) = manager();
    let repo = vcs.init_repository("pricing", "desc", "alice").unwrap();
    let first = vcs.commit(&repo.id, "main", "initial", "alice", offer(100)).unwrap();
    let second = vcs.commit(&repo.id, "main", "raise", "alice", offer(120)).unwrap();

    assert_eq!(second.parent, Some(first.id));
    assert_eq!(second.changes.len(), 1);
    let change = &second.changes[0];
    assert_eq!(change.field, "price");
    assert_eq!(change.path, "offer.price");
    assert_eq!(change.change_type, ChangeType::Modified);
    assert_eq!(change.impact, ImpactLevel::High);
    assert_eq!(change.old_value, Some(json!(100)));
    assert_eq!(change.new_value, Some(json!(120)));
}

/// Test fast-forward when main has not diverged
#[test]
fn test_fast_forward_merge() {
    let (vcs, _) = manager();
    let repo = vcs.init_repository("pricing", "desc", "alice").unwrap();
    let base = vcs.commit(&repo.id, "main", "initial", "alice", offer(100)).unwrap();

    let branch = vcs.create_branch(&repo.id, "experiment", None, "bob").unwrap();
    assert_eq!(branch.head, Some(base.id));
    let tip = vcs
        .commit(&repo.id, "experiment", "try 150", "bob", offer(150))
        .unwrap();
    let commits_before = vcs.get_repository(&repo.id).unwrap().commit_count();

    let record = vcs.merge(&repo.id, "experiment", "main", "bob").unwrap();
    assert_eq!(record.status, MergeStatus::Completed);
    assert!(record.fast_forward);
    assert_eq!(record.commit, Some(tip.id));

    let after = vcs.get_repository(&repo.id).unwrap();
    assert_eq!(after.branch("main").unwrap().head, Some(tip.id));
    assert_eq!(after.commit_count(), commits_before);
}

/// Test divergent price edits produce a conflicted merge
#[test]
fn test_conflicted_merge() {
    let (vcs, _) = manager();
    let repo = vcs.init_repository("pricing", "desc", "alice").unwrap();
    vcs.commit(&repo.id, "main", "initial", "alice", offer(100)).unwrap();
    vcs.create_branch(&repo.id, "experiment", None, "bob").unwrap();

    let exp = vcs.commit(&repo.id, "experiment", "up", "bob", offer(150)).unwrap();
    let main = vcs.commit(&repo.id, "main", "down", "alice", offer(90)).unwrap();
    let commits_before = vcs.get_repository(&repo.id).unwrap().commit_count();

    let record = vcs.merge(&repo.id, "experiment", "main", "carol").unwrap();
    assert_eq!(record.status, MergeStatus::Conflicted);
    assert!(record.commit.is_none());
    assert_eq!(record.conflicts.len(), 1);
    let conflict = &record.conflicts[0];
    assert_eq!(conflict.field, "price");
    assert_eq!(conflict.base_value, Some(json!(100)));
    assert_eq!(conflict.branch_value, Some(json!(150)));
    assert_eq!(conflict.target_value, Some(json!(90)));

    let after = vcs.get_repository(&repo.id).unwrap();
    assert_eq!(after.branch("main").unwrap().head, Some(main.id));
    assert_eq!(after.branch("experiment").unwrap().head, Some(exp.id));
    assert_eq!(after.commit_count(), commits_before);
    assert_eq!(vcs.merge_history(&repo.id).unwrap(), vec![record]);
}

/// Test a clean three-way merge yields one two-parent commit
#[test]
fn test_clean_three_way_merge() {
    let (vcs, _) = manager();
    let repo = vcs.init_repository("pricing", "desc", "alice").unwrap();
    vcs.commit(&repo.id, "main", "initial", "alice", offer(100)).unwrap();
    vcs.create_branch(&repo.id, "experiment", None, "bob").unwrap();

    let exp = vcs.commit(&repo.id, "experiment", "up", "bob", offer(104)).unwrap();
    let main = vcs
        .commit(
            &repo.id,
            "main",
            "copy",
            "alice",
            offer(100).with("description", "Lisbon super saver"),
        )
        .unwrap();

    let record = vcs.merge(&repo.id, "experiment", "main", "carol").unwrap();
    assert_eq!(record.status, MergeStatus::Completed);
    assert!(!record.fast_forward);

    let merged = vcs.get_commit(&repo.id, "main").unwrap();
    assert_eq!(Some(merged.id), record.commit);
    assert_eq!(merged.parents().collect::<Vec<_>>(), vec![main.id, exp.id]);
    assert_eq!(merged.record.get("price"), Some(&json!(104)));
    assert_eq!(
        merged.record.get("description"),
        Some(&json!("Lisbon super saver"))
    );
    assert_eq!(vcs.get_repository(&repo.id).unwrap().head, Some(merged.id));
}

/// Test re-serialized numbers neither diff nor conflict
#[test]
fn test_reformatted_number_merges_cleanly() {
    let (vcs, _) = manager();
    let repo = vcs.init_repository("pricing", "desc", "alice").unwrap();
    vcs.commit(&repo.id, "main", "initial", "alice", offer(100)).unwrap();
    vcs.create_branch(&repo.id, "experiment", None, "bob").unwrap();

    let resaved = vcs
        .commit(
            &repo.id,
            "experiment",
            "resave",
            "bob",
            offer(100).with("price", 100.0),
        )
        .unwrap();
    assert!(resaved.changes.is_empty());
    vcs.commit(&repo.id, "main", "raise", "alice", offer(120)).unwrap();

    let record = vcs.merge(&repo.id, "experiment", "main", "carol").unwrap();
    assert_eq!(record.status, MergeStatus::Completed);
    assert!(record.conflicts.is_empty());
    let merged = vcs.get_commit(&repo.id, "main").unwrap();
    assert_eq!(merged.record.get("price"), Some(&json!(120)));
}

/// Test duplicate tag names are rejected without mutation
#[test]
fn test_duplicate_tag_rejected() {
    init_tracing();
    let backend = Arc::new(MemoryBackend::new());
    let audit = Arc::new(MemoryAuditLog::new());
    let vcs = RepositoryManager::new(backend).with_audit(audit.clone());

    let repo = vcs.init_repository("pricing", "desc", "alice").unwrap();
    let first = vcs.commit(&repo.id, "main", "initial", "alice", offer(100)).unwrap();
    let tag = vcs
        .create_tag(&repo.id, "v1", None, "launch", "alice", true)
        .unwrap();
    assert_eq!(tag.commit, first.id);

    vcs.commit(&repo.id, "main", "raise", "alice", offer(110)).unwrap();
    let err = vcs
        .create_tag(&repo.id, "v1", None, "again", "alice", false)
        .unwrap_err();
    assert!(matches!(err, VcsError::TagExists(_)));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.kind().http_status(), 400);

    let tags = vcs.list_tags(&repo.id).unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].commit, first.id);
    assert_eq!(tags[0].message, "launch");
    assert_eq!(vcs.get_tag(&repo.id, "v1").unwrap().commit, first.id);
    let err = vcs.get_tag(&repo.id, "v2").unwrap_err();
    assert!(matches!(err, VcsError::TagNotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(audit.with_action(ACTION_TAG_CREATED).len(), 1);
}

/// Test diff applied to the old snapshot reproduces the new one
#[test]
fn test_diff_round_trip() {
    let (vcs, _) = manager();
    let repo = vcs.init_repository("pricing", "desc", "alice").unwrap();
    let a = vcs
        .commit(&repo.id, "main", "a", "alice", offer(100).with("cabin", "economy"))
        .unwrap();
    let b = vcs
        .commit(&repo.id, "main", "b", "alice", offer(80).with("bags", 2))
        .unwrap();

    let changes = vcs
        .get_diff(&repo.id, &a.id.to_hex(), &b.id.to_hex())
        .unwrap();
    assert_eq!(changes.len(), 3);
    assert_eq!(apply_changes(&a.record, &changes), b.record);
}

/// Test a failed write leaves no visible mutation
#[test]
fn test_persistence_failure_rolls_back() {
    let (vcs, backend) = manager();
    let repo = vcs.init_repository("pricing", "desc", "alice").unwrap();
    let base = vcs.commit(&repo.id, "main", "initial", "alice", offer(100)).unwrap();
    vcs.create_branch(&repo.id, "experiment", None, "bob").unwrap();
    vcs.commit(&repo.id, "experiment", "up", "bob", offer(150)).unwrap();
    let before = vcs.get_repository(&repo.id).unwrap();

    backend.set_fail_writes(true);
    for err in [
        vcs.commit(&repo.id, "main", "x", "alice", offer(101)).map(|_| ()),
        vcs.create_branch(&repo.id, "other", None, "bob").map(|_| ()),
        vcs.create_tag(&repo.id, "v1", None, "", "bob", false).map(|_| ()),
        vcs.merge(&repo.id, "experiment", "main", "bob").map(|_| ()),
    ] {
        assert_eq!(err.unwrap_err().kind(), ErrorKind::Persistence);
    }
    assert!(vcs.init_repository("other", "", "alice").is_err());

    let after = vcs.get_repository(&repo.id).unwrap();
    assert_eq!(after.commit_count(), before.commit_count());
    assert_eq!(after.branches, before.branches);
    assert!(after.tags.is_empty());
    assert!(after.merges().is_empty());
    assert_eq!(after.branch("main").unwrap().head, Some(base.id));
    assert_eq!(vcs.list_repositories().len(), 1);

    backend.set_fail_writes(false);
    assert!(vcs.merge(&repo.id, "experiment", "main", "bob").is_ok());
}

/// Test every head, tag, and parent references a known commit
#[test]
fn test_no_dangling_references() {
    let (vcs, backend) = manager();
    let repo = vcs.init_repository("pricing", "desc", "alice").unwrap();
    vcs.commit(&repo.id, "main", "a", "alice", offer(100)).unwrap();
    vcs.create_branch(&repo.id, "x", None, "bob").unwrap();
    vcs.commit(&repo.id, "x", "b", "bob", offer(103)).unwrap();
    vcs.commit(&repo.id, "main", "c", "alice", offer(100).with("bags", 1)).unwrap();
    vcs.merge(&repo.id, "x", "main", "bob").unwrap();
    vcs.create_tag(&repo.id, "v1", Some("main"), "", "bob", false).unwrap();

    let repo = vcs.get_repository(&repo.id).unwrap();
    repo.check_integrity().unwrap();
    for commit in repo.commits() {
        for parent in commit.parents() {
            assert!(repo.contains(&parent));
        }
    }

    let key = VcsConfig::default().repository_key(&repo.id);
    let bytes = backend.get(&key).unwrap().unwrap();
    let persisted = offervcs_storage::Repository::from_json(&bytes).unwrap();
    assert_eq!(persisted.commit_count(), repo.commit_count());
    assert_eq!(persisted.merges(), repo.merges());
}

/// Test restoring repositories from the filesystem backend
#[test]
fn test_restore_from_filesystem() {
    init_tracing();
    let dir = TempDir::new().unwrap();

    let (repo_id, head) = {
        let vcs = RepositoryManager::new(Arc::new(FsBackend::new(dir.path())));
        let repo = vcs.init_repository("pricing", "desc", "alice").unwrap();
        vcs.commit(&repo.id, "main", "a", "alice", offer(100)).unwrap();
        let head = vcs.commit(&repo.id, "main", "b", "alice", offer(95)).unwrap();
        vcs.create_tag(&repo.id, "v1", None, "", "alice", true).unwrap();
        (repo.id, head.id)
    };

    let vcs = RepositoryManager::new(Arc::new(FsBackend::new(dir.path())));
    assert!(vcs.list_repositories().is_empty());
    let restored = vcs.load_repository(&repo_id).unwrap();
    assert_eq!(restored.head, Some(head));
    assert_eq!(vcs.resolve(&repo_id, "v1").unwrap(), head);
    assert_eq!(vcs.get_commit_history(&repo_id, "main", 0).unwrap().len(), 2);

    let next = vcs.commit(&repo_id, "main", "c", "alice", offer(97)).unwrap();
    assert_eq!(next.parent, Some(head));
}

/// Test repository id collisions are rejected
#[test]
fn test_repository_id_collision() {
    init_tracing();
    let backend = Arc::new(MemoryBackend::new());
    let clock = Arc::new(FixedClock(Utc.timestamp_opt(1_700_000_000, 0).unwrap()));

    let first = RepositoryManager::new(backend.clone()).with_clock(clock.clone());
    let repo = first.init_repository("pricing", "", "alice").unwrap();

    let second = RepositoryManager::new(backend).with_clock(clock);
    second.load_repository(&repo.id).unwrap();
    let err = second.init_repository("pricing", "", "alice").unwrap_err();
    assert!(matches!(err, VcsError::RepositoryExists(_)));
}

/// Test concurrent commits are serialized into one chain
#[test]
fn test_concurrent_commits_serialize() {
    let (vcs, _) = manager();
    let vcs = Arc::new(vcs);
    let repo = vcs.init_repository("pricing", "desc", "alice").unwrap();

    let handles: Vec<_> = (0..8u64)
        .map(|t| {
            let vcs = Arc::clone(&vcs);
            let repo_id = repo.id.clone();
            thread::spawn(move || {
                for i in 0..10u64 {
                    vcs.commit(&repo_id, "main", "tick", "worker", offer(100 + t * 10 + i))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let history = vcs.get_commit_history(&repo.id, "main", 0).unwrap();
    assert_eq!(history.len(), 80);
    let ids: HashSet<_> = history.iter().map(|c| c.id).collect();
    assert_eq!(ids.len(), 80);
    for pair in history.windows(2) {
        assert_eq!(pair[0].parent, Some(pair[1].id));
    }
}

/// Test events and custom configuration
#[test]
fn test_events_and_config() {
    init_tracing();
    let config = VcsConfig::from_toml_str(
        r#"
default_branch = "trunk"

[impact]
field_overrides = { description = "high" }
"#,
    )
    .unwrap();
    let events = Arc::new(MemoryEventSink::new());
    let vcs = RepositoryManager::with_config(Arc::new(MemoryBackend::new()), config)
        .with_events(events.clone());

    let repo = vcs.init_repository("pricing", "desc", "alice").unwrap();
    assert!(vcs.list_branches(&repo.id).unwrap()[0].name == "trunk");
    vcs.commit(&repo.id, "trunk", "a", "alice", offer(100)).unwrap();
    let c = vcs
        .commit(&repo.id, "trunk", "b", "alice", offer(100).with("description", "new"))
        .unwrap();
    assert_eq!(c.changes[0].impact, ImpactLevel::High);

    let events = events.events();
    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], RepositoryEvent::RepositoryCreated { .. }));
    assert!(events.iter().all(|e| e.repo_id() == repo.id));
}
