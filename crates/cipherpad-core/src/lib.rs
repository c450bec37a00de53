//! # cipherpad core
//!
//! Core library for cipherpad, a single-note encrypted store.
//!
//! The note lives at rest as one authenticated ciphertext blob. The key that
//! opens it is derived from a passphrase (or a platform-held secret), kept in
//! memory for a user-chosen window, and then wiped.
//!
//! ## Architecture
//!
//! - **crypto**: key labels, key material, and the AEAD engine
//! - **cache**: the time-boxed, process-wide secret cache
//! - **storage**: the opaque blob store contract and its implementations
//! - **persist**: the debounced controller that turns edits into blobs

pub mod cache;
pub mod crypto;
pub mod error;
pub mod fs;
pub mod persist;
pub mod storage;

pub use cache::{SecretCache, TtlPreset};
pub use crypto::{DigestAlgorithm, Engine, KdfParams, KeyMaterial, Label, SecretInput};
pub use error::{CipherpadError, Result};
pub use persist::{NoteController, PersistEvent, PersistOutcome};
pub use storage::BlobStore;

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
