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

//! Audit and event collaborators
//!
//! Both are best-effort: the engine logs their failures and carries on.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const ACTION_REPOSITORY_CREATED: &str = "repository.created";
pub const ACTION_REPOSITORY_LOADED: &str = "repository.loaded";
pub const ACTION_OFFER_COMMITTED: &str = "offer.committed";
pub const ACTION_BRANCH_CREATED: &str = "branch.created";
pub const ACTION_TAG_CREATED: &str = "tag.created";
pub const ACTION_BRANCH_MERGED: &str = "branch.merged";

/// Audit sink failure
#[derive(Debug, Error)]
#[error("Audit error: {0}")]
pub struct AuditError(pub String);

/// Event sink failure
#[derive(Debug, Error)]
#[error("Event publish error: {0}")]
pub struct EventError(pub String);

/// Receives one record per mutating operation
pub trait AuditLogger: Send + Sync {
    fn log_action(&self, action: &str, actor: &str, details: &Value) -> Result<(), AuditError>;
}

/// Audit logger that writes to the `offervcs::audit` tracing target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditLogger;

impl AuditLogger for TracingAuditLogger {
    fn log_action(&self, action: &str, actor: &str, details: &Value) -> Result<(), AuditError> {
        tracing::info!(target: "offervcs::audit", action, actor, details = %details, "audit");
        Ok(())
    }
}

/// A captured audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action: String,
    pub actor: String,
    pub details: Value,
    pub recorded_at: DateTime<Utc>,
}

/// In-memory audit log
#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries so far
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }

    /// Entries with the given action name
    pub fn with_action(&self, action: &str) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.action == action)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl AuditLogger for MemoryAuditLog {
    fn log_action(&self, action: &str, actor: &str, details: &Value) -> Result<(), AuditError> {
        self.entries.lock().push(AuditEntry {
            action: action.to_string(),
            actor: actor.to_string(),
            details: details.clone(),
            recorded_at: Utc::now(),
        });
        Ok(())
    }
}

/// Advisory notification of a repository change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RepositoryEvent {
    RepositoryCreated {
        repo_id: String,
    },
    RepositoryLoaded {
        repo_id: String,
    },
    Committed {
        repo_id: String,
        branch: String,
        commit: String,
    },
    BranchCreated {
        repo_id: String,
        branch: String,
        head: String,
    },
    TagCreated {
        repo_id: String,
        tag: String,
        commit: String,
    },
    Merged {
        repo_id: String,
        source: String,
        target: String,
        merge_id: String,
        status: String,
    },
}

impl RepositoryEvent {
    /// Repository the event refers to
    pub fn repo_id(&self) -> &str {
        match self {
            RepositoryEvent::RepositoryCreated { repo_id }
            | RepositoryEvent::RepositoryLoaded { repo_id }
            | RepositoryEvent::Committed { repo_id, .. }
            | RepositoryEvent::BranchCreated { repo_id, .. }
            | RepositoryEvent::TagCreated { repo_id, .. }
            | RepositoryEvent::Merged { repo_id, .. } => repo_id,
        }
    }
}

/// Optional stream of repository change notifications
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &RepositoryEvent) -> Result<(), EventError>;
}

/// Event sink that buffers events in memory
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<RepositoryEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RepositoryEvent> {
        self.events.lock().clone()
    }
}

impl EventSink for MemoryEventSink {
    fn publish(&self, event: &RepositoryEvent) -> Result<(), EventError> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}
