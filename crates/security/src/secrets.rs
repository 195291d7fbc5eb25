//! API-key encryption at rest using AES-256-GCM.
//!
//! The encrypted form is an opaque base64 string (nonce || ciphertext) so it
//! can be stored on the Agent entity without the domain crate depending on
//! any crypto types.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 12;

/// Errors from secret operations.
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("malformed ciphertext: {0}")]
    Malformed(String),
}

/// Encrypts and decrypts provider API keys with a passphrase-derived key.
pub struct KeyVault {
    cipher: Aes256Gcm,
}

impl KeyVault {
    /// Derive a 256-bit key from the passphrase and build the cipher.
    pub fn new(passphrase: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"agentforge.keyvault.v1");
        hasher.update(passphrase.as_bytes());
        let key_bytes = hasher.finalize();
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
        Self { cipher }
    }

    /// Encrypt a plaintext key. Each call uses a fresh random nonce, so the
    /// same plaintext never produces the same ciphertext twice.
    pub fn encrypt(&self, plaintext: &str) -> String {
        use rand::Rng;
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill(&mut nonce_bytes[..]);
        let nonce = Nonce::from_slice(&nonce_bytes);

        // Aes256Gcm::encrypt only fails on absurd plaintext lengths.
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .unwrap_or_default();

        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);
        BASE64.encode(combined)
    }

    /// Decrypt an encrypted key produced by [`KeyVault::encrypt`].
    pub fn decrypt(&self, encoded: &str) -> Result<String, SecretError> {
        let combined = BASE64
            .decode(encoded)
            .map_err(|e| SecretError::Malformed(e.to_string()))?;
        if combined.len() < NONCE_LEN {
            return Err(SecretError::Malformed("too short".into()));
        }
        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| SecretError::DecryptionFailed("authentication failed".into()))?;

        String::from_utf8(plaintext)
            .map_err(|_| SecretError::DecryptionFailed("invalid UTF-8".into()))
    }

    /// Check whether an output string contains any of the known secrets.
    /// Used by tests and by the invoker's redaction checks.
    pub fn scan_for_leakage(output: &str, secrets: &[String]) -> bool {
        secrets.iter().any(|s| !s.is_empty() && output.contains(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let vault = KeyVault::new("operator-passphrase");
        let plaintext = "sk-1234567890abcdef";

        let encrypted = vault.encrypt(plaintext);
        assert!(!encrypted.contains(plaintext));

        let decrypted = vault.decrypt(&encrypted).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn fresh_nonce_per_encryption() {
        let vault = KeyVault::new("passphrase");
        let a = vault.encrypt("same-secret");
        let b = vault.encrypt("same-secret");
        assert_ne!(a, b);
        assert_eq!(vault.decrypt(&a).unwrap(), vault.decrypt(&b).unwrap());
    }

    #[test]
    fn wrong_passphrase_fails_authentication() {
        let right = KeyVault::new("correct");
        let wrong = KeyVault::new("incorrect");

        let encrypted = right.encrypt("my-api-key");
        assert!(wrong.decrypt(&encrypted).is_err());
    }

    #[test]
    fn malformed_input_rejected() {
        let vault = KeyVault::new("p");
        assert!(matches!(vault.decrypt("!!!not-base64"), Err(SecretError::Malformed(_))));
        assert!(matches!(vault.decrypt("c2hvcnQ"), Err(SecretError::Malformed(_))));
    }

    #[test]
    fn encrypt_empty_string() {
        let vault = KeyVault::new("p");
        let enc = vault.encrypt("");
        assert_eq!(vault.decrypt(&enc).unwrap(), "");
    }

    #[test]
    fn leakage_detection() {
        let secrets = vec!["sk-abc123".to_string()];
        assert!(KeyVault::scan_for_leakage("key is sk-abc123", &secrets));
        assert!(!KeyVault::scan_for_leakage("nothing here", &secrets));
        assert!(!KeyVault::scan_for_leakage("anything", &["".to_string()]));
    }
}
