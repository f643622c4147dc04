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

//! Identifiers and Clock
//!
//! Commit, merge, and repository identifiers are BLAKE3 digests of their
//! inputs, so the same inputs always produce the same identifier.

use blake3::Hasher;
use chrono::{DateTime, Utc};
use offervcs_core::{OfferRecord, VcsError, VcsResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Commit ID - BLAKE3 hash (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommitId(pub [u8; 32]);

impl CommitId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short hex form (7 bytes, 14 chars)
    pub fn short(&self) -> String {
        hex::encode(&self.0[..7])
    }

    /// Full hex representation
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a full 64-char hex string
    pub fn from_hex(hex_str: &str) -> Result<Self, ParseError> {
        let bytes = hex::decode(hex_str).map_err(|_| ParseError::InvalidHex)?;
        let arr: [u8; 32] = bytes.try_into().map_err(|_| ParseError::InvalidLength)?;
        Ok(Self(arr))
    }

    /// Check if this ID starts with the given hex prefix
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.to_hex().starts_with(&prefix.to_ascii_lowercase())
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}

// Persisted snapshots carry commit ids as hex strings
impl Serialize for CommitId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for CommitId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        CommitId::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Parse errors for CommitId
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    InvalidHex,
    InvalidLength,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidHex => write!(f, "Invalid hex string"),
            ParseError::InvalidLength => write!(f, "Invalid length (expected 32 bytes)"),
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Serialize)]
struct CommitHashInput<'a> {
    repo_id: &'a str,
    branch: &'a str,
    message: &'a str,
    author: &'a str,
    record: &'a OfferRecord,
    timestamp_us: i64,
}

/// Content-derived commit identifier
pub fn commit_id(
    repo_id: &str,
    branch: &str,
    message: &str,
    author: &str,
    record: &OfferRecord,
    timestamp: DateTime<Utc>,
) -> VcsResult<CommitId> {
    let input = CommitHashInput {
        repo_id,
        branch,
        message,
        author,
        record,
        timestamp_us: timestamp.timestamp_micros(),
    };

    let mut hasher = Hasher::new();
    bincode::serialize_into(&mut hasher, &input)
        .map_err(|e| VcsError::Serialization(e.to_string()))?;
    Ok(CommitId(hasher.finalize().into()))
}

/// Repository identifier derived from name and creation time
pub fn repository_id(name: &str, created_at: DateTime<Utc>) -> String {
    let digest = digest_parts(&[name, &created_at.timestamp_micros().to_string()]);
    format!("repo_{}", &digest[..16])
}

/// Merge record identifier
pub fn merge_id(
    repo_id: &str,
    source: &str,
    target: &str,
    author: &str,
    timestamp: DateTime<Utc>,
) -> String {
    let ts = timestamp.timestamp_micros().to_string();
    let digest = digest_parts(&[repo_id, source, target, author, &ts]);
    format!("merge_{}", &digest[..16])
}

/// Hash length-prefixed parts so ("ab", "c") and ("a", "bc") differ
fn digest_parts(parts: &[&str]) -> String {
    let mut hasher = Hasher::new();
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Source of wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// System wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant (replays and tests)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
