//! Platform secrets kept in the OS keychain.
//!
//! A keychain-protected note is encrypted under 32 random bytes stored
//! base64-encoded in the keychain entry for that note.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use zeroize::Zeroizing;

use crate::constants::KEYCHAIN_SERVICE;

pub fn generate_key_bytes() -> anyhow::Result<Zeroizing<Vec<u8>>> {
    let mut bytes = Zeroizing::new(vec![0u8; 32]);
    getrandom::getrandom(bytes.as_mut_slice())
        .map_err(|e| anyhow::anyhow!("Failed to generate key bytes: {}", e))?;
    Ok(bytes)
}

/// Keychain account name for the note at `path`.
pub fn note_account(path: &Path) -> String {
    let hash = blake3::hash(stable_path(path).to_string_lossy().as_bytes());
    hash.to_hex()[..16].to_string()
}

/// Store a platform secret for `account`.
pub fn keychain_store_secret(account: &str, secret: &[u8]) -> anyhow::Result<()> {
    let encoded = Zeroizing::new(STANDARD.encode(secret));
    keychain_entry(account)?
        .set_password(&encoded)
        .map_err(|e| anyhow::anyhow!("Keychain write failed: {}", e))
}

/// Read the platform secret for `account`, if one is stored.
pub fn keychain_load_secret(account: &str) -> anyhow::Result<Option<Zeroizing<Vec<u8>>>> {
    let entry = keychain_entry(account)?;
    let encoded = match entry.get_password() {
        Ok(value) => Zeroizing::new(value),
        Err(keyring::Error::NoEntry) => return Ok(None),
        Err(err) => return Err(anyhow::anyhow!("Keychain read failed: {}", err)),
    };
    let bytes = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| anyhow::anyhow!("Keychain secret is corrupt: {}", e))?;
    Ok(Some(Zeroizing::new(bytes)))
}

pub fn keychain_clear(account: &str) -> anyhow::Result<()> {
    let entry = keychain_entry(account)?;
    match entry.delete_password() {
        Ok(()) => Ok(()),
        Err(keyring::Error::NoEntry) => Ok(()),
        Err(err) => Err(anyhow::anyhow!("Keychain delete failed: {}", err)),
    }
}

fn keychain_entry(account: &str) -> anyhow::Result<keyring::Entry> {
    keyring::Entry::new(KEYCHAIN_SERVICE, account)
        .map_err(|e| anyhow::anyhow!("Keychain entry failed: {}", e))
}

/// Canonical form of a note path that may not exist yet.
fn stable_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map(|dir| dir.join(name))
            .unwrap_or_else(|_| path.to_path_buf()),
        _ => path.to_path_buf(),
    }
}
