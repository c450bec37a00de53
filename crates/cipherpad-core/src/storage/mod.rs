//! Blob storage.
//!
//! The core only needs `exists / get / set` over one opaque blob. Network
//! retry and conflict handling belong to the concrete store, not here.

mod file;
mod memory;
mod traits;

pub use file::FileBlobStore;
pub use memory::MemoryBlobStore;
pub use traits::BlobStore;
