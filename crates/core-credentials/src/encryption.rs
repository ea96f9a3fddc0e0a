//! AES-256-GCM envelope encryption for credentials at rest.
//!
//! Output format is `nonce (12 bytes) || ciphertext`, same shape used
//! elsewhere in this codebase for encrypting stored secrets.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::Rng;

use crate::error::CredentialError;

const KEY_LENGTH: usize = 32;
const NONCE_LENGTH: usize = 12;

pub fn encrypt(plaintext: &[u8], key: &[u8; KEY_LENGTH]) -> Result<Vec<u8>, CredentialError> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| CredentialError::Encryption(e.to_string()))?;

    let mut nonce_bytes = [0u8; NONCE_LENGTH];
    rand::thread_rng().fill(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| CredentialError::Encryption(e.to_string()))?;

    let mut result = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend(ciphertext);
    Ok(result)
}

pub fn decrypt(encrypted: &[u8], key: &[u8; KEY_LENGTH]) -> Result<Vec<u8>, CredentialError> {
    if encrypted.len() < NONCE_LENGTH {
        return Err(CredentialError::Encryption("ciphertext too short".into()));
    }
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| CredentialError::Encryption(e.to_string()))?;

    let (nonce_bytes, ciphertext) = encrypted.split_at(NONCE_LENGTH);
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| CredentialError::Encryption(e.to_string()))
}

pub fn encrypt_json<T: serde::Serialize>(
    value: &T,
    key: &[u8; KEY_LENGTH],
) -> Result<Vec<u8>, CredentialError> {
    let json = serde_json::to_vec(value)?;
    encrypt(&json, key)
}

pub fn decrypt_json<T: serde::de::DeserializeOwned>(
    encrypted: &[u8],
    key: &[u8; KEY_LENGTH],
) -> Result<T, CredentialError> {
    let plaintext = decrypt(encrypted, key)?;
    Ok(serde_json::from_slice(&plaintext)?)
}

/// Load the 32-byte master key from `ENCRYPTION_KEY` (hex-encoded).
/// There is no fallback key: a missing or malformed key is a startup error.
pub fn load_master_key() -> Result<[u8; KEY_LENGTH], CredentialError> {
    let key_hex = std::env::var("ENCRYPTION_KEY")
        .map_err(|_| CredentialError::MissingKey)?;
    let bytes = hex::decode(&key_hex).map_err(|_| CredentialError::MalformedKey)?;
    if bytes.len() != KEY_LENGTH {
        return Err(CredentialError::MalformedKey);
    }
    let mut key = [0u8; KEY_LENGTH];
    key.copy_from_slice(&bytes);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> [u8; KEY_LENGTH] {
        [7u8; KEY_LENGTH]
    }

    #[test]
    fn roundtrips_plaintext() {
        let key = test_key();
        let encrypted = encrypt(b"hello", &key).unwrap();
        assert_eq!(decrypt(&encrypted, &key).unwrap(), b"hello");
    }

    #[test]
    fn roundtrips_json() {
        let key = test_key();
        let value = serde_json::json!({"access_token": "abc123"});
        let encrypted = encrypt_json(&value, &key).unwrap();
        let decrypted: serde_json::Value = decrypt_json(&encrypted, &key).unwrap();
        assert_eq!(value, decrypted);
    }

    #[test]
    fn rejects_truncated_ciphertext() {
        let key = test_key();
        assert!(decrypt(&[1, 2, 3], &key).is_err());
    }
}
