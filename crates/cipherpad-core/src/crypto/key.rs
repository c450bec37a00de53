//! Key material.
//!
//! [`KeyMaterial`] pairs a [`Label`] with the derived key bytes. The bytes
//! are wiped from memory when the value is dropped, and they never show up
//! in `Debug` output.

use std::fmt;

use chrono::{DateTime, Utc};
use secrecy::{SecretSlice, SecretString};
use zeroize::Zeroizing;

use super::label::Label;

/// What the user handed over to unlock the note.
pub enum SecretInput {
    /// A typed passphrase.
    Passphrase(SecretString),
    /// A platform-held secret released by a device unlock at `created_at`.
    Biometric {
        created_at: DateTime<Utc>,
        secret: SecretSlice<u8>,
    },
}

impl SecretInput {
    pub fn passphrase(value: impl Into<String>) -> Self {
        SecretInput::Passphrase(SecretString::from(value.into()))
    }

    pub fn biometric(created_at: DateTime<Utc>, secret: Vec<u8>) -> Self {
        SecretInput::Biometric {
            created_at,
            secret: SecretSlice::from(secret),
        }
    }
}

impl fmt::Debug for SecretInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretInput::Passphrase(_) => f.write_str("SecretInput::Passphrase([REDACTED])"),
            SecretInput::Biometric { created_at, .. } => f
                .debug_struct("SecretInput::Biometric")
                .field("created_at", created_at)
                .field("secret", &"[REDACTED]")
                .finish(),
        }
    }
}

/// A derived key plus the label describing how it was derived.
#[derive(Clone)]
pub struct KeyMaterial {
    label: Label,
    bytes: Zeroizing<Vec<u8>>,
}

impl KeyMaterial {
    /// Wrap raw key bytes.
    ///
    /// The caller is responsible for ensuring the bytes come from a secure source.
    pub fn from_bytes(label: Label, bytes: Vec<u8>) -> Self {
        Self {
            label,
            bytes: Zeroizing::new(bytes),
        }
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    /// Raw key bytes. Use only for immediate cryptographic operations.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl PartialEq for KeyMaterial {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label && constant_time_eq(&self.bytes, &other.bytes)
    }
}

impl Eq for KeyMaterial {}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("label", &self.label)
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_key_bytes() {
        let key = KeyMaterial::from_bytes(Label::default(), vec![0xAB; 64]);
        let debug_output = format!("{:?}", key);

        assert!(debug_output.contains("REDACTED"));
        assert!(debug_output.contains("Passphrase"));
        assert!(!debug_output.contains(&hex::encode([0xABu8; 4])));
        assert!(!debug_output.contains("171"));
    }

    #[test]
    fn test_secret_input_debug_redacts() {
        let input = SecretInput::passphrase("hunter2-hunter2");
        assert!(!format!("{:?}", input).contains("hunter2"));
    }

    #[test]
    fn test_equality_covers_label_and_bytes() {
        let a = KeyMaterial::from_bytes(Label::default(), vec![1, 2, 3]);
        let b = KeyMaterial::from_bytes(Label::default(), vec![1, 2, 3]);
        let c = KeyMaterial::from_bytes(Label::default(), vec![1, 2, 4]);
        let d = KeyMaterial::from_bytes(Label::biometric(Utc::now()), vec![1, 2, 3]);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }
}
