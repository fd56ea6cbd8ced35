// Cryptographic utilities for cookie encryption and handshake tokens

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use rand::{distr::Alphanumeric, Rng, RngCore};
use serde::{de::DeserializeOwned, Serialize};

/// Nonce size for AES-256-GCM encryption (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Encryption key size for AES-256 (256 bits)
pub const ENCRYPTION_KEY_SIZE: usize = 32;

/// Length of the correlation key used by stateless handshakes
pub const CORRELATION_KEY_LENGTH: usize = 40;

/// Generate a random correlation key for a stateless handshake
///
/// The key is embedded in the callback URL and used to look up the
/// temporary credentials in the cache, so it is restricted to ASCII
/// alphanumerics and never needs escaping.
#[must_use]
pub fn generate_correlation_key() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(CORRELATION_KEY_LENGTH)
        .map(char::from)
        .collect()
}

/// Generic encryption function for any serializable data using AES-256-GCM
///
/// # Returns
///
/// A Base64URL-encoded string containing the nonce + ciphertext
///
/// # Errors
///
/// Returns an error if:
/// - Serialization fails
/// - Key length is invalid
/// - AES encryption fails
pub fn encrypt_data<T: Serialize>(data: &T, key: &[u8]) -> Result<String> {
    if key.len() != ENCRYPTION_KEY_SIZE {
        return Err(anyhow!(
            "Invalid key length: expected {ENCRYPTION_KEY_SIZE} bytes, got {}",
            key.len()
        ));
    }

    let json_data = serde_json::to_string(data).context("Failed to serialize data")?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let ciphertext = cipher
        .encrypt(nonce, json_data.as_bytes())
        .map_err(|e| anyhow!("AES encryption failed: {e}"))?;

    let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    combined.extend_from_slice(&nonce_bytes);
    combined.extend_from_slice(&ciphertext);

    Ok(general_purpose::URL_SAFE_NO_PAD.encode(&combined))
}

/// Generic decryption function for any deserializable data using AES-256-GCM
///
/// # Errors
///
/// Returns an error if:
/// - Key length is invalid
/// - Base64 decoding fails
/// - Data length is invalid
/// - AES decryption fails
/// - Deserialization fails
pub fn decrypt_data<T: DeserializeOwned>(encrypted_data: &str, key: &[u8]) -> Result<T> {
    if key.len() != ENCRYPTION_KEY_SIZE {
        return Err(anyhow!(
            "Invalid key length: expected {ENCRYPTION_KEY_SIZE} bytes, got {}",
            key.len()
        ));
    }

    let combined = general_purpose::URL_SAFE_NO_PAD
        .decode(encrypted_data)
        .context("Failed to decode base64 data")?;

    if combined.len() < NONCE_SIZE {
        return Err(anyhow!("Invalid data length"));
    }

    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| anyhow!("AES decryption failed: {e}"))?;

    let data: T = serde_json::from_slice(&plaintext)
        .context("Failed to deserialize data from decrypted JSON")?;

    Ok(data)
}

/// Derive a proper 32-byte encryption key from input key material
///
/// Keys shorter than 32 bytes are extended with a simple positional scheme;
/// longer keys are truncated. An empty input yields an all-zero key.
#[must_use]
pub fn derive_encryption_key(input_key: &[u8]) -> [u8; ENCRYPTION_KEY_SIZE] {
    let mut encryption_key = [0u8; ENCRYPTION_KEY_SIZE];
    let key_len = std::cmp::min(input_key.len(), ENCRYPTION_KEY_SIZE);
    encryption_key[..key_len].copy_from_slice(&input_key[..key_len]);

    if key_len > 0 && key_len < ENCRYPTION_KEY_SIZE {
        for i in key_len..ENCRYPTION_KEY_SIZE {
            encryption_key[i] =
                encryption_key[i % key_len].wrapping_add(u8::try_from(i % 256).unwrap_or(0));
        }
    }

    encryption_key
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        identifier: String,
        secret: String,
    }

    #[test]
    fn test_correlation_key_shape() {
        let key = generate_correlation_key();
        assert_eq!(key.len(), CORRELATION_KEY_LENGTH);
        assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_correlation_keys_differ() {
        assert_ne!(generate_correlation_key(), generate_correlation_key());
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let key = derive_encryption_key(b"test_key_32_bytes_long_for_test_");
        let sample = Sample {
            identifier: "temp-id".to_string(),
            secret: "temp-secret".to_string(),
        };

        let encrypted = encrypt_data(&sample, &key).unwrap();
        assert!(!encrypted.contains("temp-secret"));

        let decrypted: Sample = decrypt_data(&encrypted, &key).unwrap();
        assert_eq!(decrypted, sample);
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let key = derive_encryption_key(b"first-key");
        let other = derive_encryption_key(b"second-key");
        let encrypted = encrypt_data(&"payload", &key).unwrap();

        assert!(decrypt_data::<String>(&encrypted, &other).is_err());
    }

    #[test]
    fn test_invalid_key_length_rejected() {
        assert!(encrypt_data(&"payload", b"short").is_err());
        assert!(decrypt_data::<String>("abc", b"short").is_err());
    }

    #[test]
    fn test_derive_encryption_key_extends_short_keys() {
        let key = derive_encryption_key(b"abc");
        assert_eq!(&key[..3], b"abc");
        assert!(key[3..].iter().any(|b| *b != 0));
    }
}
