//! Authenticated encryption for confidential vault values, built on
//! ChaCha20-Poly1305. Ciphertext is kept as base64 text of
//! `nonce || ciphertext || tag` so it can live in a `String` field.

use base64::{Engine, engine::general_purpose::STANDARD};
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::error::DeskError;

const NONCE_LEN: usize = 12;

/// Symmetric key held by one store for its whole lifetime.
pub struct ContentCipher {
    key: Key,
}

impl ContentCipher {
    /// Fresh random key. Values encrypted under it are unreadable once it is dropped.
    pub fn generate() -> Self {
        Self {
            key: ChaCha20Poly1305::generate_key(&mut OsRng),
        }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, DeskError> {
        let cipher = ChaCha20Poly1305::new(&self.key);
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let sealed = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| DeskError::Cipher(format!("encryption failed: {e}")))?;

        let mut token = Vec::with_capacity(NONCE_LEN + sealed.len());
        token.extend_from_slice(&nonce);
        token.extend_from_slice(&sealed);
        Ok(STANDARD.encode(token))
    }

    pub fn decrypt(&self, token: &str) -> Result<String, DeskError> {
        let raw = STANDARD
            .decode(token.as_bytes())
            .map_err(|e| DeskError::Cipher(format!("base64 decoding failed: {e}")))?;
        if raw.len() < NONCE_LEN {
            return Err(DeskError::Cipher("token shorter than nonce".to_string()));
        }
        let (nonce, sealed) = raw.split_at(NONCE_LEN);

        let cipher = ChaCha20Poly1305::new(&self.key);
        let plain = cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|e| DeskError::Cipher(format!("decryption failed: {e}")))?;
        String::from_utf8(plain).map_err(|e| DeskError::Cipher(format!("invalid utf-8: {e}")))
    }
}

impl Drop for ContentCipher {
    fn drop(&mut self) {
        self.key.as_mut_slice().zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ciphertext_hides_and_restores_the_value() {
        let cipher = ContentCipher::generate();
        let token = cipher.encrypt("secret").unwrap();
        assert_ne!(token, "secret");
        assert!(!token.contains("secret"));
        assert_eq!(cipher.decrypt(&token).unwrap(), "secret");
    }

    #[test]
    fn same_plaintext_gets_a_fresh_nonce() {
        let cipher = ContentCipher::generate();
        assert_ne!(cipher.encrypt("x").unwrap(), cipher.encrypt("x").unwrap());
    }

    #[test]
    fn another_key_cannot_read_the_value() {
        let token = ContentCipher::generate().encrypt("secret").unwrap();
        let err = ContentCipher::generate().decrypt(&token).unwrap_err();
        assert!(err.to_string().contains("decryption failed"));
    }

    #[test]
    fn rejects_malformed_tokens() {
        let cipher = ContentCipher::generate();
        assert!(cipher.decrypt("***").is_err());
        assert!(cipher.decrypt(&STANDARD.encode([0u8; 4])).is_err());
    }
}
