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


//! Offervcs Storage Layer
//!
//! Versioned storage for offer records: a commit graph per repository,
//! branches and tags, diffs with impact grading, and merges, persisted as
//! JSON snapshots through a pluggable backend.
//!
//! ## Usage
//!
//! ```rust
//! use offervcs_core::OfferRecord;
//! use offervcs_storage::{MemoryBackend, RepositoryManager};
//! use std::sync::Arc;
//!
//! let manager = RepositoryManager::new(Arc::new(MemoryBackend::new()));
//! let repo = manager.init_repository("pricing", "Summer fares", "alice")?;
//! let offer = OfferRecord::new("off1").with("price", 100);
//! manager.commit(&repo.id, "main", "initial", "alice", offer)?;
//! # Ok::<(), offervcs_core::VcsError>(())
//! ```

pub mod persistence;
pub mod versioning;

pub use persistence::{FsBackend, MemoryBackend, PersistError, PersistenceBackend};
pub use versioning::{
    Branch, Change, ChangeType, Commit, CommitId, Conflict, DiffEngine, MergeRecord, MergeStatus,
    Repository, RepositoryManager, Tag,
};
