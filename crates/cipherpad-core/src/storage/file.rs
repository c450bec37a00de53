//! Local-file blob store.

use std::path::{Path, PathBuf};

use crate::error::{CipherpadError, Result};
use crate::fs::write_atomic;

use super::BlobStore;

/// Stores the blob in a single file, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    path: PathBuf,
}

impl FileBlobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlobStore for FileBlobStore {
    fn exists(&self) -> Result<bool> {
        match std::fs::metadata(&self.path) {
            Ok(meta) => Ok(meta.is_file() && meta.len() > 0),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(storage_error("stat", &self.path, err)),
        }
    }

    fn get(&self) -> Result<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(storage_error("read", &self.path, err)),
        }
    }

    fn set(&self, blob: &[u8]) -> Result<()> {
        write_atomic(&self.path, blob).map_err(|err| storage_error("write", &self.path, err))?;
        tracing::debug!(path = %self.path.display(), bytes = blob.len(), "blob written");
        Ok(())
    }
}

fn storage_error(action: &str, path: &Path, err: std::io::Error) -> CipherpadError {
    CipherpadError::Storage(format!(
        "Failed to {} note {}: {}",
        action,
        path.display(),
        err
    ))
}
