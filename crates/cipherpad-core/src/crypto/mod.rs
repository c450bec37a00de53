//! Cryptographic operations for cipherpad.
//!
//! - **SHA-512** turns a passphrase into key bytes
//! - **Argon2id** stretches key bytes into a fresh data key per blob
//! - **AES-256-GCM** seals the note and authenticates the header
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of the stored blob
//! - Offline brute-force attacks on the passphrase
//! - Tampering with the blob at rest
//!
//! We do NOT defend against:
//! - Compromised OS / keylogger
//! - Access to an unlocked session / memory

pub mod engine;
pub mod key;
pub mod label;

pub use engine::{EncryptedBlob, Engine, KdfParams};
pub use key::{KeyMaterial, SecretInput};
pub use label::{DigestAlgorithm, Label};
