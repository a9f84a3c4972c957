//! Authenticated encryption of document identifiers.
//!
//! AES-256-GCM with a fresh 96-bit nonce per call. The nonce is prepended to the ciphertext, so
//! an encrypted identifier is `nonce || ciphertext || tag`.

use crate::error::{Error, Result};
use crate::util::{random_bytes, KEY_BYTES};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::{CryptoRng, RngCore};

/// Size of the prepended nonce in bytes.
pub const NONCE_BYTES: usize = 12;

/// Size of the authentication tag in bytes.
pub const TAG_BYTES: usize = 16;

pub fn encrypt<R: RngCore + CryptoRng>(
    key: &[u8; KEY_BYTES],
    plaintext: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce: [u8; NONCE_BYTES] = random_bytes(rng);

    let ct = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| Error::Encryption)?;

    let mut out = Vec::with_capacity(NONCE_BYTES + ct.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ct);

    Ok(out)
}

/// Decrypts `nonce || ciphertext`.
///
/// Returns [`Error::Integrity`] when the input is truncated or does not authenticate.
pub fn decrypt(key: &[u8; KEY_BYTES], data: &[u8]) -> Result<Vec<u8>> {
    if data.len() < NONCE_BYTES + TAG_BYTES {
        return Err(Error::Integrity);
    }

    let (nonce, ct) = data.split_at(NONCE_BYTES);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));

    cipher
        .decrypt(Nonce::from_slice(nonce), ct)
        .map_err(|_| Error::Integrity)
}
