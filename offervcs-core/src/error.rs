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

//! Version control error types

use crate::validation::ValidationResult;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for version control operations
pub type VcsResult<T> = Result<T, VcsError>;

/// Errors returned by the version control engine.
///
/// Merge conflicts are deliberately absent: a conflicted merge is a terminal
/// merge state, not a failure.
#[derive(Debug, Error)]
pub enum VcsError {
    /// Repository not found
    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    /// Branch not found in a repository
    #[error("Branch not found: {branch} (repository {repo_id})")]
    BranchNotFound { repo_id: String, branch: String },

    /// Tag not found in a repository
    #[error("Tag not found: {tag} (repository {repo_id})")]
    TagNotFound { repo_id: String, tag: String },

    /// Commit or revision not found
    #[error("Commit not found: {0}")]
    CommitNotFound(String),

    /// Branch exists but has no commits to operate on
    #[error("Branch has no commits: {0}")]
    EmptyBranch(String),

    /// Record rejected by structural validation
    #[error("Record validation failed: {0}")]
    Validation(ValidationResult),

    /// Branch or tag name violates reference naming rules
    #[error("Invalid reference name {name:?}: {reason}")]
    InvalidRefName { name: String, reason: String },

    /// Repository identifier already taken
    #[error("Repository already exists: {0}")]
    RepositoryExists(String),

    /// Branch name already taken
    #[error("Branch already exists: {0}")]
    BranchExists(String),

    /// Tag name already taken
    #[error("Tag already exists: {0}")]
    TagExists(String),

    /// Commit id already present in the repository
    #[error("Commit already exists: {0}")]
    CommitExists(String),

    /// Durable write failed; the mutation was not applied
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse error classification for calling layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Persistence,
}

impl ErrorKind {
    /// HTTP status code equivalent
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::NotFound => 404,
            ErrorKind::Validation | ErrorKind::Conflict => 400,
            ErrorKind::Persistence => 500,
        }
    }
}

impl VcsError {
    /// Classify this error so callers never need to match on messages
    pub fn kind(&self) -> ErrorKind {
        match self {
            VcsError::RepositoryNotFound(_)
            | VcsError::BranchNotFound { .. }
            | VcsError::TagNotFound { .. }
            | VcsError::CommitNotFound(_)
            | VcsError::EmptyBranch(_) => ErrorKind::NotFound,
            VcsError::Validation(_) | VcsError::InvalidRefName { .. } | VcsError::Config(_) => {
                ErrorKind::Validation
            }
            VcsError::RepositoryExists(_)
            | VcsError::BranchExists(_)
            | VcsError::TagExists(_)
            | VcsError::CommitExists(_) => ErrorKind::Conflict,
            VcsError::Persistence(_) | VcsError::Serialization(_) | VcsError::Io(_) => {
                ErrorKind::Persistence
            }
        }
    }

    /// Per-field violations, if this is a validation error
    pub fn validation(&self) -> Option<&ValidationResult> {
        match self {
            VcsError::Validation(result) => Some(result),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for VcsError {
    fn from(e: serde_json::Error) -> Self {
        VcsError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for VcsError {
    fn from(e: toml::de::Error) -> Self {
        VcsError::Config(e.to_string())
    }
}
