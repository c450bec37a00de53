//! Authenticated encryption of the note.
//!
//! Blob layout, version 1 (integers big-endian):
//!
//! ```text
//! magic "CPAD" | version u8 | label_len u16 | label utf-8
//! | m_cost u32 | t_cost u32 | p_cost u32 | salt [16] | nonce [12]
//! | AES-256-GCM ciphertext || tag [16]
//! ```
//!
//! The data key for each blob is Argon2id(key bytes, salt) using the cost
//! parameters recorded in the header, and the whole header is bound as
//! associated data. Salt and nonce are drawn fresh for every call, so two
//! encryptions of the same text under the same key never match.
//!
//! Decryption has exactly one failure mode. A wrong key, a flipped bit, a
//! truncated header, and an unknown version all return
//! [`CipherpadError::AuthenticationFailure`].

use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::Argon2;
use secrecy::ExposeSecret;
use sha2::digest::Output;
use sha2::{Digest, Sha512};
use zeroize::Zeroizing;

use super::key::{KeyMaterial, SecretInput};
use super::label::{DigestAlgorithm, Label};
use crate::error::{CipherpadError, Result};

const MAGIC: &[u8; 4] = b"CPAD";
const FORMAT_VERSION: u8 = 1;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const DATA_KEY_LEN: usize = 32;

/// Upper bounds accepted when reading cost parameters back from a blob.
const MAX_MEMORY_KIB: u32 = 1024 * 1024;
const MAX_ITERATIONS: u32 = 64;
const MAX_PARALLELISM: u32 = 16;

/// Argon2id cost parameters used to stretch key bytes into a per-blob data key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    /// 64 MiB, 3 passes, single lane.
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 3,
            parallelism: 1,
        }
    }
}

impl KdfParams {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            iterations,
            parallelism,
        }
    }

    /// Check the parameters against what Argon2 accepts and what this build
    /// is willing to spend.
    pub fn validate(&self) -> Result<()> {
        if self.parallelism == 0 || self.parallelism > MAX_PARALLELISM {
            return Err(CipherpadError::InvalidInput(format!(
                "KDF parallelism must be between 1 and {}",
                MAX_PARALLELISM
            )));
        }
        if self.iterations == 0 || self.iterations > MAX_ITERATIONS {
            return Err(CipherpadError::InvalidInput(format!(
                "KDF iterations must be between 1 and {}",
                MAX_ITERATIONS
            )));
        }
        if self.memory_kib < 8 * self.parallelism || self.memory_kib > MAX_MEMORY_KIB {
            return Err(CipherpadError::InvalidInput(format!(
                "KDF memory must be between {} and {} KiB",
                8 * self.parallelism,
                MAX_MEMORY_KIB
            )));
        }
        Ok(())
    }

    fn argon2(&self) -> Result<Argon2<'static>> {
        let params = argon2::Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(DATA_KEY_LEN),
        )
        .map_err(|e| CipherpadError::Crypto(format!("Failed to create Argon2 params: {}", e)))?;
        Ok(Argon2::new(
            argon2::Algorithm::Argon2id,
            argon2::Version::V0x13,
            params,
        ))
    }
}

/// An encrypted note as produced by [`Engine::encrypt`].
///
/// Storage treats it as opaque bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedBlob(Vec<u8>);

impl EncryptedBlob {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for EncryptedBlob {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for EncryptedBlob {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for EncryptedBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedBlob")
            .field("len", &self.0.len())
            .finish()
    }
}

/// Derives keys and seals/opens note content.
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    kdf: KdfParams,
}

impl Engine {
    /// Build an engine that writes new blobs with the given cost parameters.
    pub fn new(kdf: KdfParams) -> Result<Self> {
        kdf.validate()?;
        Ok(Self { kdf })
    }

    pub fn kdf(&self) -> KdfParams {
        self.kdf
    }

    /// Turn user input into key material.
    ///
    /// Passphrases are digested with the default algorithm and the label
    /// records which one. Platform secrets are used as-is.
    pub fn derive(&self, input: SecretInput) -> Result<KeyMaterial> {
        match input {
            SecretInput::Passphrase(passphrase) => {
                let digest = DigestAlgorithm::default();
                let bytes = digest_passphrase(digest, passphrase.expose_secret())?;
                Ok(KeyMaterial::from_bytes(Label::Passphrase { digest }, bytes))
            }
            SecretInput::Biometric { created_at, secret } => {
                let secret = secret.expose_secret();
                if secret.is_empty() {
                    return Err(CipherpadError::InvalidInput(
                        "Platform secret is empty".to_string(),
                    ));
                }
                Ok(KeyMaterial::from_bytes(
                    Label::biometric(created_at),
                    secret.to_vec(),
                ))
            }
        }
    }

    /// Encrypt `plaintext` under `key` with a fresh salt and nonce.
    pub fn encrypt(&self, plaintext: &str, key: &KeyMaterial) -> Result<EncryptedBlob> {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        fill_random(&mut salt)?;
        fill_random(&mut nonce)?;

        let label = key.label().to_string();
        let label_len = u16::try_from(label.len())
            .map_err(|_| CipherpadError::Crypto("Key label is too long".to_string()))?;

        let mut out = Vec::with_capacity(
            MAGIC.len() + 3 + label.len() + 12 + SALT_LEN + NONCE_LEN + plaintext.len() + TAG_LEN,
        );
        out.extend_from_slice(MAGIC);
        out.push(FORMAT_VERSION);
        out.extend_from_slice(&label_len.to_be_bytes());
        out.extend_from_slice(label.as_bytes());
        out.extend_from_slice(&self.kdf.memory_kib.to_be_bytes());
        out.extend_from_slice(&self.kdf.iterations.to_be_bytes());
        out.extend_from_slice(&self.kdf.parallelism.to_be_bytes());
        out.extend_from_slice(&salt);
        out.extend_from_slice(&nonce);

        let data_key = stretch(&self.kdf, key.as_bytes(), &salt)?;
        let cipher = Aes256Gcm::new_from_slice(data_key.as_slice())
            .map_err(|e| CipherpadError::Crypto(format!("Failed to create cipher: {}", e)))?;
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce),
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: &out,
                },
            )
            .map_err(|_| CipherpadError::Crypto("Encryption failed".to_string()))?;
        out.extend_from_slice(&ciphertext);

        Ok(EncryptedBlob(out))
    }

    /// Decrypt a blob written by [`Engine::encrypt`].
    ///
    /// An empty blob means there is no content yet and yields an empty string
    /// without touching the cipher.
    pub fn decrypt(&self, blob: impl AsRef<[u8]>, key: &KeyMaterial) -> Result<Zeroizing<String>> {
        let blob = blob.as_ref();
        if blob.is_empty() {
            return Ok(Zeroizing::new(String::new()));
        }

        let header = Header::parse(blob).ok_or(CipherpadError::AuthenticationFailure)?;
        if header.kdf.validate().is_err() {
            return Err(CipherpadError::AuthenticationFailure);
        }

        let data_key = stretch(&header.kdf, key.as_bytes(), header.salt)
            .map_err(|_| CipherpadError::AuthenticationFailure)?;
        let cipher = Aes256Gcm::new_from_slice(data_key.as_slice())
            .map_err(|_| CipherpadError::AuthenticationFailure)?;
        let plaintext = cipher
            .decrypt(
                Nonce::from_slice(header.nonce),
                Payload {
                    msg: &blob[header.len..],
                    aad: &blob[..header.len],
                },
            )
            .map(Zeroizing::new)
            .map_err(|_| CipherpadError::AuthenticationFailure)?;

        let text =
            std::str::from_utf8(&plaintext).map_err(|_| CipherpadError::AuthenticationFailure)?;
        Ok(Zeroizing::new(text.to_owned()))
    }

    /// Read the key label from a blob header without decrypting anything.
    ///
    /// Returns `None` for empty or unrecognizable blobs.
    pub fn peek_label(blob: impl AsRef<[u8]>) -> Option<Label> {
        Header::parse(blob.as_ref()).map(|header| header.label)
    }
}

struct Header<'a> {
    label: Label,
    kdf: KdfParams,
    salt: &'a [u8],
    nonce: &'a [u8],
    len: usize,
}

impl<'a> Header<'a> {
    fn parse(blob: &'a [u8]) -> Option<Self> {
        let mut reader = Reader { buf: blob, pos: 0 };
        if reader.take(MAGIC.len())? != MAGIC {
            return None;
        }
        if reader.take(1)?[0] != FORMAT_VERSION {
            return None;
        }
        let label_len = reader.u16()? as usize;
        let label = std::str::from_utf8(reader.take(label_len)?).ok()?;
        let kdf = KdfParams::new(reader.u32()?, reader.u32()?, reader.u32()?);
        let salt = reader.take(SALT_LEN)?;
        let nonce = reader.take(NONCE_LEN)?;
        if blob.len() < reader.pos + TAG_LEN {
            return None;
        }
        Some(Self {
            label: Label::parse(label),
            kdf,
            salt,
            nonce,
            len: reader.pos,
        })
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(n)?;
        let slice = self.buf.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    fn u16(&mut self) -> Option<u16> {
        let bytes = self.take(2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self) -> Option<u32> {
        let bytes = self.take(4)?;
        Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

fn digest_passphrase(digest: DigestAlgorithm, passphrase: &str) -> Result<Vec<u8>> {
    if passphrase.trim().is_empty() {
        return Err(CipherpadError::InvalidInput(
            "Passphrase cannot be empty".to_string(),
        ));
    }
    match digest {
        DigestAlgorithm::Sha512 => {
            // Hash straight into the buffer that becomes the key.
            let mut bytes = vec![0u8; digest.output_len()];
            let mut hasher = Sha512::new();
            hasher.update(passphrase.as_bytes());
            hasher.finalize_into(Output::<Sha512>::from_mut_slice(&mut bytes));
            Ok(bytes)
        }
    }
}

fn stretch(kdf: &KdfParams, key: &[u8], salt: &[u8]) -> Result<Zeroizing<[u8; DATA_KEY_LEN]>> {
    let mut data_key = Zeroizing::new([0u8; DATA_KEY_LEN]);
    kdf.argon2()?
        .hash_password_into(key, salt, data_key.as_mut_slice())
        .map_err(|e| CipherpadError::Crypto(format!("Key stretching failed: {}", e)))?;
    Ok(data_key)
}

fn fill_random(buf: &mut [u8]) -> Result<()> {
    getrandom::getrandom(buf)
        .map_err(|e| CipherpadError::Crypto(format!("System RNG unavailable: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn engine() -> Engine {
        Engine::new(KdfParams::new(8, 1, 1)).unwrap()
    }

    fn passphrase_key(passphrase: &str) -> KeyMaterial {
        engine()
            .derive(SecretInput::passphrase(passphrase))
            .unwrap()
    }

    #[test]
    fn test_passphrase_derivation_is_deterministic() {
        let key1 = passphrase_key("alpha");
        let key2 = passphrase_key("alpha");

        assert_eq!(key1, key2);
        assert_eq!(key1.as_bytes().len(), DigestAlgorithm::Sha512.output_len());
        assert_eq!(key1.label(), &Label::default());
    }

    #[test]
    fn test_passphrase_derivation_matches_sha512() {
        let key = passphrase_key("abc");
        assert_eq!(
            hex::encode(&key.as_bytes()[..8]),
            // First 8 bytes of SHA-512("abc").
            "ddaf35a193617aba"
        );
    }

    #[test]
    fn test_passphrase_digest_fills_key_buffer_in_place() {
        let bytes = digest_passphrase(DigestAlgorithm::Sha512, "abc").unwrap();

        assert_eq!(bytes.len(), DigestAlgorithm::Sha512.output_len());
        assert_eq!(bytes.capacity(), bytes.len());
        assert_eq!(bytes.as_slice(), Sha512::digest(b"abc").as_slice());
    }

    #[test]
    fn test_blank_passphrase_rejected() {
        let result = engine().derive(SecretInput::passphrase("   "));
        assert!(matches!(result, Err(CipherpadError::InvalidInput(_))));
    }

    #[test]
    fn test_biometric_derivation_keeps_secret_and_timestamp() {
        let created_at = Utc::now();
        let key = engine()
            .derive(SecretInput::biometric(created_at, vec![7u8; 32]))
            .unwrap();

        assert_eq!(key.as_bytes(), &[7u8; 32]);
        assert_eq!(key.label(), &Label::biometric(created_at));
    }

    #[test]
    fn test_empty_biometric_secret_rejected() {
        let result = engine().derive(SecretInput::biometric(Utc::now(), Vec::new()));
        assert!(matches!(result, Err(CipherpadError::InvalidInput(_))));
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let key = passphrase_key("alpha");
        let blob = engine().encrypt("hello", &key).unwrap();

        assert_eq!(engine().decrypt(&blob, &key).unwrap().as_str(), "hello");
    }

    #[test]
    fn test_blob_header_carries_label() {
        let key = passphrase_key("alpha");
        let blob = engine().encrypt("hello", &key).unwrap();

        assert!(blob.as_bytes().starts_with(MAGIC));
        assert_eq!(Engine::peek_label(&blob), Some(Label::default()));
        assert_eq!(Engine::peek_label(b""), None);
        assert_eq!(Engine::peek_label(b"not a blob"), None);
    }

    #[test]
    fn test_empty_blob_decrypts_to_empty_text() {
        let key = passphrase_key("alpha");
        assert_eq!(engine().decrypt(b"", &key).unwrap().as_str(), "");
    }

    #[test]
    fn test_decrypt_uses_params_from_header() {
        let key = passphrase_key("alpha");
        let writer = Engine::new(KdfParams::new(16, 2, 1)).unwrap();
        let blob = writer.encrypt("costly", &key).unwrap();

        // A reader configured differently still opens the blob.
        assert_eq!(engine().decrypt(&blob, &key).unwrap().as_str(), "costly");
    }

    #[test]
    fn test_truncated_blob_is_authentication_failure() {
        let key = passphrase_key("alpha");
        let blob = engine().encrypt("hello", &key).unwrap();

        for cut in [1, 4, 10, blob.len() - 1] {
            let result = engine().decrypt(&blob.as_bytes()[..cut], &key);
            assert!(matches!(result, Err(CipherpadError::AuthenticationFailure)));
        }
    }

    #[test]
    fn test_tampered_label_is_authentication_failure() {
        let key = passphrase_key("alpha");
        let mut bytes = engine().encrypt("hello", &key).unwrap().into_bytes();
        // First label byte sits right after magic, version and length.
        bytes[7] ^= 0x01;

        let result = engine().decrypt(&bytes, &key);
        assert!(matches!(result, Err(CipherpadError::AuthenticationFailure)));
    }

    #[test]
    fn test_absurd_kdf_params_are_rejected_without_running_kdf() {
        let key = passphrase_key("alpha");
        let mut bytes = engine().encrypt("hello", &key).unwrap().into_bytes();
        let label_len = Label::default().to_string().len();
        let m_cost_at = 4 + 1 + 2 + label_len;
        bytes[m_cost_at..m_cost_at + 4].copy_from_slice(&u32::MAX.to_be_bytes());

        let result = engine().decrypt(&bytes, &key);
        assert!(matches!(result, Err(CipherpadError::AuthenticationFailure)));
    }

    #[test]
    fn test_invalid_engine_params_rejected() {
        assert!(Engine::new(KdfParams::new(8, 0, 1)).is_err());
        assert!(Engine::new(KdfParams::new(4, 1, 1)).is_err());
        assert!(Engine::new(KdfParams::new(8, 1, 0)).is_err());
        assert!(Engine::new(KdfParams::default()).is_ok());
    }
}
