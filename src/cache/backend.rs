// Copyright 2024-2026 Lectern Contributors
// SPDX-License-Identifier: Apache-2.0

//! Persistence for the cache record.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{CacheError, CacheMap};

/// Reads and writes the whole cache map as one unit.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Load the map. A missing record is an empty map, not an error.
    async fn read(&self) -> Result<CacheMap, CacheError>;

    /// Replace the record with `map`.
    async fn write(&self, map: &CacheMap) -> Result<(), CacheError>;
}

/// JSON file record at `<dir>/<namespace>.json`.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// reader never sees a half-written record.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl AsRef<Path>, namespace: &str) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", namespace)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CacheBackend for FileBackend {
    async fn read(&self) -> Result<CacheMap, CacheError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(CacheMap::new()),
            Err(e) => return Err(CacheError::Read(e.to_string())),
        };
        serde_json::from_slice(&bytes).map_err(|e| CacheError::Corrupt(e.to_string()))
    }

    async fn write(&self, map: &CacheMap) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheError::Write(e.to_string()))?;
        }
        let json = serde_json::to_vec_pretty(map).map_err(|e| CacheError::Write(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| CacheError::Write(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| CacheError::Write(e.to_string()))
    }
}

/// In-process record, with switches to simulate an unavailable store.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    record: Mutex<Option<CacheMap>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of the stored record, if anything was ever written.
    pub fn snapshot(&self) -> Option<CacheMap> {
        self.record.lock().clone()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    async fn read(&self) -> Result<CacheMap, CacheError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::Read("memory backend read disabled".into()));
        }
        Ok(self.record.lock().clone().unwrap_or_default())
    }

    async fn write(&self, map: &CacheMap) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Write("memory backend write disabled".into()));
        }
        *self.record.lock() = Some(map.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_backend_missing_record_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path(), "ns");
        assert!(backend.read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_backend_corrupt_record() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path(), "ns");
        std::fs::write(backend.path(), b"{not json").unwrap();
        assert!(matches!(backend.read().await, Err(CacheError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_file_backend_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("nested"), "ns");
        backend.write(&CacheMap::new()).await.unwrap();
        assert!(backend.path().exists());
        assert!(!backend.path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_memory_backend_failure_switches() {
        let backend = MemoryBackend::new();
        backend.set_fail_writes(true);
        assert!(backend.write(&CacheMap::new()).await.is_err());
        backend.set_fail_reads(true);
        assert!(backend.read().await.is_err());
    }
}
