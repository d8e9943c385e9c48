//! Message content encryption at rest.
//!
//! XChaCha20-Poly1305 with a random 24-byte nonce per message. The stored
//! form is `base64(nonce || ciphertext)`. Key material is the SHA-256 of the
//! configured secret.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    Key, XChaCha20Poly1305, XNonce,
};
use rand::Rng;
use sha2::{Digest, Sha256};
use thiserror::Error;

const NONCE_LEN: usize = 24;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CryptoError {
    #[error("encryption failed")]
    Encrypt,
    #[error("stored content is not valid base64")]
    Encoding,
    #[error("stored content is too short to hold a nonce")]
    Truncated,
    #[error("decryption failed")]
    Decrypt,
    #[error("decrypted content is not UTF-8")]
    Utf8,
}

#[derive(Clone)]
pub struct MessageCipher {
    cipher: XChaCha20Poly1305,
}

impl MessageCipher {
    pub fn new(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let key = Key::from_slice(&digest);
        Self {
            cipher: XChaCha20Poly1305::new(key),
        }
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::rng().fill(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(XNonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| CryptoError::Encrypt)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(sealed))
    }

    pub fn decrypt(&self, stored: &str) -> Result<String, CryptoError> {
        let sealed = STANDARD.decode(stored).map_err(|_| CryptoError::Encoding)?;
        if sealed.len() <= NONCE_LEN {
            return Err(CryptoError::Truncated);
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);

        let plaintext = self
            .cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::Decrypt)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::Utf8)
    }
}

impl std::fmt::Debug for MessageCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MessageCipher(..)")
    }
}
