//! Symmetric encryption of user note content.
//!
//! Each user profile owns a random 256-bit key, stored base64 encoded.
//! Values are encrypted with AES-256-GCM and stored as
//! `base64(nonce || ciphertext || tag)` with a 12-byte nonce.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use rand::RngCore;
use thiserror::Error;

/// Key size in bytes.
pub const KEY_LEN: usize = 32;

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Errors from note encryption.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The key is not valid base64 or has the wrong size.
    #[error("invalid encryption key: {0}")]
    InvalidKey(String),

    /// Encryption failed.
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Ciphertext is corrupt, tampered with, or was encrypted with another key.
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
}

/// Generates keys and encrypts/decrypts strings with them.
pub trait CryptoDelegate: Send + Sync {
    /// Generate a new base64-encoded key.
    fn generate_key(&self) -> String;

    /// Encrypt `plaintext` with `key`.
    fn encrypt(&self, key: &str, plaintext: &str) -> Result<String, CryptoError>;

    /// Decrypt `ciphertext` with `key`.
    fn decrypt(&self, key: &str, ciphertext: &str) -> Result<String, CryptoError>;
}

/// AES-256-GCM implementation of [`CryptoDelegate`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AesCryptoDelegate;

impl AesCryptoDelegate {
    fn cipher(key: &str) -> Result<Aes256Gcm, CryptoError> {
        let key_bytes = BASE64
            .decode(key)
            .map_err(|e| CryptoError::InvalidKey(format!("invalid base64: {}", e)))?;

        if key_bytes.len() != KEY_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "key must be {} bytes, got {}",
                KEY_LEN,
                key_bytes.len()
            )));
        }

        Aes256Gcm::new_from_slice(&key_bytes).map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }
}

impl CryptoDelegate for AesCryptoDelegate {
    fn generate_key(&self) -> String {
        let mut key = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut key);
        BASE64.encode(key)
    }

    fn encrypt(&self, key: &str, plaintext: &str) -> Result<String, CryptoError> {
        let cipher = Self::cipher(key)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(&combined))
    }

    fn decrypt(&self, key: &str, ciphertext: &str) -> Result<String, CryptoError> {
        let cipher = Self::cipher(key)?;

        let combined = BASE64
            .decode(ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(format!("invalid base64: {}", e)))?;

        if combined.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::DecryptionFailed(
                "ciphertext too short".to_string(),
            ));
        }

        let (nonce_bytes, body) = combined.split_at(NONCE_LEN);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), body)
            .map_err(|_| CryptoError::DecryptionFailed("authentication failed".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| CryptoError::DecryptionFailed(format!("invalid UTF-8: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_key_length() {
        let key = AesCryptoDelegate.generate_key();
        assert_eq!(BASE64.decode(&key).unwrap().len(), KEY_LEN);
        assert_ne!(key, AesCryptoDelegate.generate_key());
    }

    #[test]
    fn test_encrypt_decrypt() {
        let crypto = AesCryptoDelegate;
        let key = crypto.generate_key();
        let encrypted = crypto.encrypt(&key, "blood pressure 120/80").unwrap();
        assert_ne!(encrypted, "blood pressure 120/80");
        assert_eq!(
            crypto.decrypt(&key, &encrypted).unwrap(),
            "blood pressure 120/80"
        );
    }

    #[test]
    fn test_encrypt_uses_fresh_nonce() {
        let crypto = AesCryptoDelegate;
        let key = crypto.generate_key();
        let a = crypto.encrypt(&key, "same").unwrap();
        let b = crypto.encrypt(&key, "same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_key_rejected() {
        let crypto = AesCryptoDelegate;
        assert!(matches!(
            crypto.encrypt("not base64!", "x"),
            Err(CryptoError::InvalidKey(_))
        ));
        let short = BASE64.encode([0u8; 16]);
        assert!(matches!(
            crypto.encrypt(&short, "x"),
            Err(CryptoError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_tampered_ciphertext_rejected() {
        let crypto = AesCryptoDelegate;
        let key = crypto.generate_key();
        let encrypted = crypto.encrypt(&key, "secret").unwrap();
        let mut bytes = BASE64.decode(&encrypted).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let tampered = BASE64.encode(&bytes);
        assert!(crypto.decrypt(&key, &tampered).is_err());
    }

    #[test]
    fn test_short_ciphertext_rejected() {
        let crypto = AesCryptoDelegate;
        let key = crypto.generate_key();
        let short = BASE64.encode([1u8; 10]);
        assert!(crypto.decrypt(&key, &short).is_err());
    }
}
