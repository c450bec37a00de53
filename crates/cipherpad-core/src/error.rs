//! Error types for cipherpad core operations.
//!
//! Errors are deliberately coarse around decryption: every way a blob can
//! fail to open collapses into [`CipherpadError::AuthenticationFailure`].
//! The CLI layer maps these to user-facing messages and exit codes.

use thiserror::Error;

/// Result type alias for cipherpad operations.
pub type Result<T> = std::result::Result<T, CipherpadError>;

/// Core error type for cipherpad operations.
#[derive(Debug, Error)]
pub enum CipherpadError {
    /// Wrong passphrase, wrong platform secret, or a damaged blob.
    #[error("Authentication failed")]
    AuthenticationFailure,

    /// Encryption-side failure unrelated to key correctness
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Storage adapter error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error (fallback)
    #[error("{0}")]
    Other(String),
}

impl CipherpadError {
    /// True when the caller should drop its key and ask for the secret again.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, CipherpadError::AuthenticationFailure)
    }
}

impl From<std::io::Error> for CipherpadError {
    fn from(err: std::io::Error) -> Self {
        CipherpadError::Storage(err.to_string())
    }
}

impl From<tokio::task::JoinError> for CipherpadError {
    fn from(err: tokio::task::JoinError) -> Self {
        CipherpadError::Other(format!("Background task failed: {}", err))
    }
}
