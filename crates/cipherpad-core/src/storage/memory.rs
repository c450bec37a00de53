//! In-process blob store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{CipherpadError, Result};

use super::BlobStore;

/// Keeps the blob in memory and counts writes.
///
/// Useful for embedding hosts that persist elsewhere and for tests, which
/// can also make upcoming writes fail with [`MemoryBlobStore::fail_next_writes`].
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blob: Mutex<Option<Vec<u8>>>,
    writes: AtomicUsize,
    failures: AtomicUsize,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `blob` already stored.
    pub fn with_blob(blob: Vec<u8>) -> Self {
        Self {
            blob: Mutex::new(Some(blob)),
            ..Self::default()
        }
    }

    /// Number of successful `set` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make the next `count` calls to `set` fail.
    pub fn fail_next_writes(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Vec<u8>>> {
        self.blob.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl BlobStore for MemoryBlobStore {
    fn exists(&self) -> Result<bool> {
        Ok(self.slot().is_some())
    }

    fn get(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.slot().clone())
    }

    fn set(&self, blob: &[u8]) -> Result<()> {
        let pending_failure = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if pending_failure {
            return Err(CipherpadError::Storage(
                "Simulated write failure".to_string(),
            ));
        }
        *self.slot() = Some(blob.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
