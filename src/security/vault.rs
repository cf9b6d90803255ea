//! Credential vault: symmetric encryption of integration secrets at rest.
//!
//! Provides AES-256-GCM authenticated encryption for credential columns
//! in the configuration store (GitHub tokens, Sentry DSNs, registry
//! passwords, Firebase API keys). Ciphertext is armored as base64 so it
//! fits a TEXT column.
//!
//! # Security Properties
//!
//! - **Algorithm**: AES-256-GCM (authenticated encryption)
//! - **Key**: 32 bytes (256 bits) from a base64-encoded env var
//! - **Nonce**: 12 bytes, randomly generated per encryption
//! - **Format**: base64(nonce + ciphertext + auth tag)
//!
//! # Usage
//!
//! ```bash
//! # Generate a key
//! vigil generate-key
//!
//! # Set the environment variable
//! export ENCRYPTION_KEY="your-base64-encoded-key"
//! ```
//!
//! If no key is configured the vault generates a random one at startup
//! and logs it prominently; operators must persist it out-of-band or
//! stored ciphertext becomes unrecoverable across restarts. This is a
//! bootstrap convenience, not a key-management story.

use crate::{Error, Result};

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use base64::Engine;
use rand::Rng;

/// Nonce size for AES-256-GCM (12 bytes / 96 bits).
const NONCE_SIZE: usize = 12;

/// Key size for AES-256 (32 bytes / 256 bits).
const KEY_SIZE: usize = 32;

/// GCM authentication tag size.
const TAG_SIZE: usize = 16;

/// Symmetric encryptor for credentials at rest.
pub struct CredentialVault {
    cipher: Aes256Gcm,
}

impl CredentialVault {
    /// Creates a vault from a base64-encoded 32-byte key.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Crypto`] if the key is not valid base64 or the
    /// wrong size.
    pub fn from_key_b64(key_b64: &str) -> Result<Self> {
        let key_bytes = base64::engine::general_purpose::STANDARD
            .decode(key_b64.trim())
            .map_err(|e| Error::Crypto {
                operation: "load_key".to_string(),
                cause: format!("invalid base64 encryption key: {e}"),
            })?;

        if key_bytes.len() != KEY_SIZE {
            return Err(Error::Crypto {
                operation: "load_key".to_string(),
                cause: format!(
                    "encryption key must be {KEY_SIZE} bytes, got {}",
                    key_bytes.len()
                ),
            });
        }

        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&key_bytes);

        Ok(Self::from_key(key))
    }

    /// Creates a vault from a raw 32-byte key.
    #[must_use]
    pub fn from_key(key: [u8; KEY_SIZE]) -> Self {
        let key = Key::<Aes256Gcm>::from(key);
        Self {
            cipher: Aes256Gcm::new(&key),
        }
    }

    /// Creates a vault from the configured key, or generates a random one.
    ///
    /// When no key is configured the generated key is logged so the
    /// operator can persist it; without it, previously stored ciphertext
    /// is unrecoverable after a restart.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Crypto`] if a key is configured but invalid.
    pub fn from_key_or_generate(key_b64: Option<&str>) -> Result<Self> {
        match key_b64 {
            Some(key) if !key.trim().is_empty() => Self::from_key_b64(key),
            _ => {
                let key = Self::generate_key_b64();
                tracing::warn!(
                    encryption_key = %key,
                    "No encryption key configured; generated a new one. \
                     Store it in the ENCRYPTION_KEY environment variable or \
                     stored credentials will be unrecoverable after restart"
                );
                Self::from_key_b64(&key)
            },
        }
    }

    /// Generates a fresh random key, base64-encoded.
    #[must_use]
    pub fn generate_key_b64() -> String {
        let mut key = [0u8; KEY_SIZE];
        rand::rng().fill_bytes(&mut key);
        base64::engine::general_purpose::STANDARD.encode(key)
    }

    /// Encrypts a plaintext credential into a base64-armored string.
    ///
    /// Empty input short-circuits to an empty output without touching
    /// the cipher, so optional credential columns stay empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Crypto`] if encryption fails.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from(nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| Error::Crypto {
                operation: "encrypt".to_string(),
                cause: format!("AES-256-GCM encryption failed: {e}"),
            })?;

        let mut raw = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        raw.extend_from_slice(&nonce_bytes);
        raw.extend_from_slice(&ciphertext);

        Ok(base64::engine::general_purpose::STANDARD.encode(raw))
    }

    /// Decrypts a base64-armored ciphertext back to plaintext.
    ///
    /// Empty input short-circuits to an empty output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Crypto`] if the armor is invalid, the ciphertext
    /// is truncated, or authentication fails (wrong key or tampering).
    pub fn decrypt(&self, armored: &str) -> Result<String> {
        if armored.is_empty() {
            return Ok(String::new());
        }

        let raw = base64::engine::general_purpose::STANDARD
            .decode(armored)
            .map_err(|e| Error::Crypto {
                operation: "decrypt".to_string(),
                cause: format!("invalid base64 ciphertext: {e}"),
            })?;

        if raw.len() < NONCE_SIZE + TAG_SIZE {
            return Err(Error::Crypto {
                operation: "decrypt".to_string(),
                cause: format!("ciphertext too short: {} bytes", raw.len()),
            });
        }

        let nonce_array: [u8; NONCE_SIZE] =
            raw[..NONCE_SIZE].try_into().map_err(|_| Error::Crypto {
                operation: "decrypt".to_string(),
                cause: "invalid nonce length".to_string(),
            })?;
        let nonce = Nonce::from(nonce_array);
        let ciphertext = &raw[NONCE_SIZE..];

        let plaintext = self
            .cipher
            .decrypt(&nonce, ciphertext)
            .map_err(|e| Error::Crypto {
                operation: "decrypt".to_string(),
                cause: format!("AES-256-GCM decryption failed (wrong key or corrupted data): {e}"),
            })?;

        String::from_utf8(plaintext).map_err(|e| Error::Crypto {
            operation: "decrypt".to_string(),
            cause: format!("decrypted data is not UTF-8: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_vault() -> CredentialVault {
        CredentialVault::from_key([
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d,
            0x0e, 0x0f, 0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x1b,
            0x1c, 0x1d, 0x1e, 0x1f,
        ])
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let vault = test_vault();
        let secret = "ghp_exampletoken1234567890";

        let armored = vault.encrypt(secret).unwrap();
        assert_ne!(armored, secret);

        let decrypted = vault.decrypt(&armored).unwrap();
        assert_eq!(decrypted, secret);
    }

    #[test]
    fn test_empty_string_passthrough() {
        let vault = test_vault();
        assert_eq!(vault.encrypt("").unwrap(), "");
        assert_eq!(vault.decrypt("").unwrap(), "");
    }

    #[test]
    fn test_different_nonces_produce_different_ciphertext() {
        let vault = test_vault();

        let a = vault.encrypt("same secret").unwrap();
        let b = vault.encrypt("same secret").unwrap();
        assert_ne!(a, b);

        assert_eq!(vault.decrypt(&a).unwrap(), vault.decrypt(&b).unwrap());
    }

    #[test]
    fn test_wrong_key_fails() {
        let vault = test_vault();
        let mut other_key = [0u8; 32];
        other_key[0] = 0xff;
        let other = CredentialVault::from_key(other_key);

        let armored = vault.encrypt("secret").unwrap();
        assert!(other.decrypt(&armored).is_err());
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let vault = test_vault();
        let armored = vault.encrypt("secret").unwrap();

        let mut raw = base64::engine::general_purpose::STANDARD
            .decode(&armored)
            .unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        let tampered = base64::engine::general_purpose::STANDARD.encode(raw);

        assert!(vault.decrypt(&tampered).is_err());
    }

    #[test]
    fn test_key_from_base64() {
        let key = CredentialVault::generate_key_b64();
        assert!(CredentialVault::from_key_b64(&key).is_ok());

        assert!(CredentialVault::from_key_b64("AAEC").is_err());
        assert!(CredentialVault::from_key_b64("not-valid-base64!!!").is_err());
    }

    #[test]
    fn test_truncated_ciphertext_fails() {
        let vault = test_vault();
        let short = base64::engine::general_purpose::STANDARD.encode([0u8; 10]);
        assert!(vault.decrypt(&short).is_err());
    }
}
