//! Blob store trait definition.
//!
//! The `BlobStore` trait is the whole contract between cipherpad and
//! wherever the note ends up (a local file, a synced folder, a cloud
//! drive). The store never sees plaintext and never interprets the bytes.

use crate::error::Result;

/// Storage for exactly one opaque blob.
///
/// Implementations must ensure:
/// - `set` replaces the previous blob as a whole (no partial writes visible)
/// - failures are reported, not retried or swallowed
pub trait BlobStore: Send + Sync {
    /// True iff a blob has ever been stored.
    ///
    /// Used to choose between the "create a new secret" and "unlock the
    /// existing secret" flows.
    fn exists(&self) -> Result<bool>;

    /// The stored blob, or `None` if nothing has been stored.
    fn get(&self) -> Result<Option<Vec<u8>>>;

    /// Persist `blob`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `CipherpadError::Storage` on I/O or connectivity failure.
    fn set(&self, blob: &[u8]) -> Result<()>;
}

impl<T: BlobStore + ?Sized> BlobStore for std::sync::Arc<T> {
    fn exists(&self) -> Result<bool> {
        (**self).exists()
    }

    fn get(&self) -> Result<Option<Vec<u8>>> {
        (**self).get()
    }

    fn set(&self, blob: &[u8]) -> Result<()> {
        (**self).set(blob)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trait_is_object_safe() {
        fn _accepts_dyn(_store: &dyn BlobStore) {}
        fn _accepts_arc<T: BlobStore>(_store: std::sync::Arc<T>) {}
    }
}
