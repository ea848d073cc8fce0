//! Byte stores holding scene archives.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::storage::StorageError;

/// A flat store of named byte blobs. Entry names use `/` separators.
pub trait ArchiveStore {
    /// Read an entry. Missing entries fail with [`StorageError::MissingEntry`].
    fn read(&self, name: &str) -> Result<Vec<u8>, StorageError>;

    /// Create or replace an entry.
    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), StorageError>;

    fn exists(&self, name: &str) -> bool;
}

/// In-memory archive.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    entries: BTreeMap<String, Vec<u8>>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<u8>> {
        self.entries.remove(name)
    }
}

impl ArchiveStore for MemoryArchive {
    fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::MissingEntry(name.to_owned()))
    }

    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), StorageError> {
        self.entries.insert(name.to_owned(), data.to_vec());
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

/// Archive stored as files under a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryArchive {
    root: PathBuf,
}

impl DirectoryArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, name: &str) -> PathBuf {
        name.split('/').fold(self.root.clone(), |path, part| path.join(part))
    }
}

impl ArchiveStore for DirectoryArchive {
    fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path(name);
        std::fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::MissingEntry(name.to_owned()),
            _ => StorageError::Io { path, source: e },
        })
    }

    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), StorageError> {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        std::fs::write(&path, data).map_err(|e| StorageError::Io { path, source: e })
    }

    fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }
}
