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

//! Branches & Tags
//!
//! Named pointers into the commit graph. Branches move, tags never do.

use super::ids::CommitId;
use chrono::{DateTime, Utc};
use offervcs_core::{VcsError, VcsResult};
use serde::{Deserialize, Serialize};

/// Branch - mutable pointer to the latest commit on a line of work
///
/// Policy flags are carried for callers to enforce; the engine ignores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    /// Current commit; `None` only for the unborn default branch
    pub head: Option<CommitId>,
    pub protected: bool,
    pub requires_review: bool,
    pub min_reviews: u32,
    pub auto_merge: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl Branch {
    /// The protected main line created with every repository
    pub fn default_line(
        name: impl Into<String>,
        owner: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            head: None,
            protected: true,
            requires_review: true,
            min_reviews: 1,
            auto_merge: false,
            created_at,
            created_by: owner.into(),
        }
    }

    /// An unprotected working branch starting at `head`
    pub fn working(
        name: impl Into<String>,
        head: CommitId,
        author: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            head: Some(head),
            protected: false,
            requires_review: false,
            min_reviews: 0,
            auto_merge: false,
            created_at,
            created_by: author.into(),
        }
    }

    pub fn is_unborn(&self) -> bool {
        self.head.is_none()
    }
}

/// Tag - immutable pointer to a released or frozen revision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub commit: CommitId,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub is_release: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_notes: Option<String>,
}

/// Validate reference name (similar to Git's rules)
pub fn validate_ref_name(name: &str) -> VcsResult<()> {
    let invalid = |reason: String| VcsError::InvalidRefName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("empty name".to_string()));
    }

    if name.starts_with('.') || name.ends_with('.') || name.ends_with('/') {
        return Err(invalid("cannot start or end with '.' or end with '/'".to_string()));
    }

    if name.contains("..") {
        return Err(invalid("cannot contain '..'".to_string()));
    }

    if name.contains("//") {
        return Err(invalid("cannot contain '//'".to_string()));
    }

    let invalid_chars = ['~', '^', ':', '\\', '?', '*', '[', ' ', '\t', '\n'];
    for c in invalid_chars {
        if name.contains(c) {
            return Err(invalid(format!("cannot contain '{}'", c.escape_default())));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_line_is_protected_and_unborn() {
        let branch = Branch::default_line("main", "alice", Utc::now());
        assert!(branch.protected);
        assert!(branch.is_unborn());
        assert_eq!(branch.min_reviews, 1);
    }

    #[test]
    fn test_working_branch() {
        let head = CommitId([3u8; 32]);
        let branch = Branch::working("experiment", head, "bob", Utc::now());
        assert!(!branch.protected);
        assert_eq!(branch.head, Some(head));
    }

    #[test]
    fn test_ref_name_validation() {
        assert!(validate_ref_name("main").is_ok());
        assert!(validate_ref_name("feature/summer-fares").is_ok());
        assert!(validate_ref_name("v1.0.0").is_ok());

        assert!(validate_ref_name("").is_err());
        assert!(validate_ref_name(".hidden").is_err());
        assert!(validate_ref_name("bad..name").is_err());
        assert!(validate_ref_name("has space").is_err());
        assert!(validate_ref_name("trailing/").is_err());

        let err = validate_ref_name("a:b").unwrap_err();
        assert_eq!(err.kind(), offervcs_core::ErrorKind::Validation);
    }
}
