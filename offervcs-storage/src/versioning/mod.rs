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


//! Git-Like Offer Versioning
//!
//! Tracks successive revisions of offer records in repositories with
//! branches, tags, and field-level merges.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      RepositoryManager                           │
//! │        (RwLock, stage -> persist -> install, audit/events)       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────┐        │
//! │  │ DiffEngine  │◄────│ MergeEngine │────►│  Ancestry   │        │
//! │  │  (impact)   │     │ (ff / 3way) │     │ (1st parent)│        │
//! │  └─────────────┘     └─────────────┘     └─────────────┘        │
//! │                             │                    │               │
//! │                             ▼                    ▼               │
//! │  ┌─────────────────────────────────────────────────────┐        │
//! │  │       GraphStore: Repository -> commit arena         │        │
//! │  │   branches (mutable) / tags (immutable) / merges     │        │
//! │  └─────────────────────────────────────────────────────┘        │
//! │                             │                                    │
//! │                             ▼                                    │
//! │  ┌─────────────────────────────────────────────────────┐        │
//! │  │     PersistenceBackend  (offer_repos/<repo_id>)      │        │
//! │  └─────────────────────────────────────────────────────┘        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Features
//!
//! - **Content-Derived Ids**: BLAKE3 over commit content and metadata
//! - **Immutable Commits**: History is append-only
//! - **Impact Classification**: Numeric deltas graded low to critical
//! - **Field-Level Merges**: Conflicts reported per field, never half-applied
//! - **Durable Before Visible**: Failed writes leave no trace in memory

pub mod ancestry;
pub mod diff;
pub mod graph;
pub mod ids;
pub mod manager;
pub mod merge;
pub mod objects;
pub mod refs;

pub use ancestry::{find_common_ancestor, first_parent_walk, is_ancestor};
pub use diff::{apply_changes, DiffEngine, DiffStats};
pub use graph::{AccessLevel, GraphStore, Repository};
pub use ids::{Clock, CommitId, FixedClock, ParseError, SystemClock};
pub use manager::RepositoryManager;
pub use merge::{three_way_merge, Conflict, FieldMerge, MergeEngine, MergeRecord, MergeStatus};
pub use objects::{Change, ChangeType, Commit};
pub use refs::{validate_ref_name, Branch, Tag};
