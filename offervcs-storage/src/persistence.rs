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


//! Persistence Backends
//!
//! Repositories are stored as one JSON snapshot per key. The manager writes
//! the snapshot before a mutation becomes visible, so a backend error aborts
//! the mutation.

use dashmap::DashMap;
use offervcs_core::VcsError;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Persistence backend errors
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl From<PersistError> for VcsError {
    fn from(e: PersistError) -> Self {
        VcsError::Persistence(e.to_string())
    }
}

/// Durable key/value store for repository snapshots
pub trait PersistenceBackend: Send + Sync {
    fn set(&self, key: &str, value: &[u8]) -> Result<(), PersistError>;
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistError>;
}

/// In-memory backend
///
/// Writes can be switched off to exercise failure paths.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: DashMap<String, Vec<u8>>,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set` fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Stored keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PersistenceBackend for MemoryBackend {
    fn set(&self, key: &str, value: &[u8]) -> Result<(), PersistError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PersistError::Unavailable(format!("write to {} rejected", key)));
        }
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }
}

/// Filesystem backend: one `<key>.json` file per key under a root directory
///
/// `/` in keys maps to subdirectories. Writes go to a temp file that is then
/// renamed over the target, so readers never see a partial snapshot.
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistError> {
        let invalid = || PersistError::InvalidKey(key.to_string());
        let relative = Path::new(key);

        if key.is_empty() || key.ends_with('/') {
            return Err(invalid());
        }
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(invalid());
        }

        let mut path = self.root.join(relative);
        let file_name = format!(
            "{}.json",
            path.file_name().and_then(|n| n.to_str()).ok_or_else(invalid)?
        );
        path.set_file_name(file_name);
        Ok(path)
    }
}

impl PersistenceBackend for FsBackend {
    fn set(&self, key: &str, value: &[u8]) -> Result<(), PersistError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("json.tmp");
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(value)?;
            file.sync_all()?;
        }

        // Atomic rename
        fs::rename(&temp_path, &path)?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistError> {
        match fs::read(self.path_for(key)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
