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

//! Ancestry queries over primary-parent chains
//!
//! Only primary parents are followed. Secondary parents of merge commits are
//! not explored, so the common ancestor found after earlier merges may be
//! older than the true merge base.

use super::graph::Repository;
use super::ids::CommitId;
use super::objects::Commit;
use std::collections::HashSet;
use std::sync::Arc;

/// Iterator over a primary-parent chain, starting at the given commit
pub struct FirstParentWalk<'a> {
    repo: &'a Repository,
    next: Option<CommitId>,
}

impl<'a> Iterator for FirstParentWalk<'a> {
    type Item = &'a Arc<Commit>;

    fn next(&mut self) -> Option<Self::Item> {
        let commit = self.repo.get_commit(&self.next?)?;
        self.next = commit.parent;
        Some(commit)
    }
}

/// Walk primary parents from `start`, newest first
///
/// Ends at a root commit, or immediately if `start` is unknown.
pub fn first_parent_walk(repo: &Repository, start: CommitId) -> FirstParentWalk<'_> {
    FirstParentWalk {
        repo,
        next: Some(start),
    }
}

/// True if `ancestor` is on the primary-parent chain of `descendant`
///
/// A commit is its own ancestor.
pub fn is_ancestor(repo: &Repository, ancestor: &CommitId, descendant: &CommitId) -> bool {
    first_parent_walk(repo, *descendant).any(|c| c.id == *ancestor)
}

/// Primary-parent ancestor set of `commit`, including itself
pub fn ancestor_set(repo: &Repository, commit: CommitId) -> HashSet<CommitId> {
    first_parent_walk(repo, commit).map(|c| c.id).collect()
}

/// Nearest commit on `b`'s primary chain that is also on `a`'s
pub fn find_common_ancestor(repo: &Repository, a: CommitId, b: CommitId) -> Option<Arc<Commit>> {
    let ancestors = ancestor_set(repo, a);
    first_parent_walk(repo, b)
        .find(|c| ancestors.contains(&c.id))
        .cloned()
}
