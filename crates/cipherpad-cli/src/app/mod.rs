//! Application-level plumbing for the Cipherpad CLI.
//!
//! This module provides:
//! - Path resolution for config and note files
//! - The composition root that wires engine, cache and controller
//! - The unlock flow with passphrase retries or the keychain secret

mod context;
mod resolver;
mod unlock;

// Re-export public API
pub use context::{AppContext, Note};
pub use unlock::{unlock_note, unlock_ttl};
