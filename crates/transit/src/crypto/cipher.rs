//! AES-256-GCM-SIV encryption keyed by key name, for development use only.

use aes_gcm_siv::{
    aead::{Aead, KeyInit, OsRng},
    Aes256GcmSiv, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;
use tracing::warn;

use common::TransitError;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of an AES-GCM-SIV nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte used to right-pad key names shorter than [`KEY_LEN`].
const KEY_PAD: u8 = b'x';

/// Advisory emitted on every use of the development cipher.
pub const DEV_WARNING: &str = "using in-memory cipher - this is not secure \
    and should never be used in production-like environments!";

/// Errors produced by the development cipher.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The payload is not valid base64.
    #[error("payload is not valid base64")]
    InvalidPayload,

    /// The decoded payload is too short to contain a nonce.
    #[error("payload too short: {0} bytes")]
    TruncatedPayload(usize),

    /// Authentication failed: wrong key name or tampered ciphertext.
    #[error("aead operation failed")]
    AeadFailure,
}

impl From<CipherError> for TransitError {
    fn from(e: CipherError) -> Self {
        TransitError::Cipher(e.to_string())
    }
}

/// Derive the fixed-length symmetric key for a key name.
///
/// The name's bytes are truncated to [`KEY_LEN`] or right-padded with `x`.
/// Deterministic per name; names sharing a 32-byte prefix collide, which is
/// acceptable for this development-only path.
fn derive_key(name: &str) -> [u8; KEY_LEN] {
    let mut key = [KEY_PAD; KEY_LEN];
    let bytes = name.as_bytes();
    let n = bytes.len().min(KEY_LEN);
    key[..n].copy_from_slice(&bytes[..n]);
    key
}

fn build_cipher(name: &str) -> Aes256GcmSiv {
    let key = derive_key(name);
    Aes256GcmSiv::new(&key.into())
}

/// Encrypt `plaintext` under the key derived from `name`.
///
/// A fresh 96-bit nonce is generated per call from the OS CSPRNG, so two
/// encryptions of the same plaintext produce different payloads — only a
/// successful round-trip can be asserted, never ciphertext equality.
///
/// # Errors
///
/// Returns [`CipherError::AeadFailure`] on an internal AEAD error (should be
/// unreachable with a valid key and nonce).
pub fn seal(name: &str, plaintext: &[u8]) -> Result<String, CipherError> {
    warn!("{DEV_WARNING}");

    let cipher = build_cipher(name);

    use aes_gcm_siv::aead::rand_core::RngCore;
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CipherError::AeadFailure)?;

    let mut raw = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    raw.extend_from_slice(&nonce_bytes);
    raw.extend_from_slice(&ciphertext);
    Ok(STANDARD.encode(raw))
}

/// Decrypt a payload produced by [`seal`] under the same key name.
///
/// # Errors
///
/// Returns [`CipherError::InvalidPayload`] or
/// [`CipherError::TruncatedPayload`] if the payload is not well-formed, and
/// [`CipherError::AeadFailure`] if authentication fails (wrong key name or
/// tampered ciphertext).
pub fn open(name: &str, payload: &str) -> Result<Vec<u8>, CipherError> {
    warn!("{DEV_WARNING}");

    let raw = STANDARD
        .decode(payload)
        .map_err(|_| CipherError::InvalidPayload)?;
    if raw.len() < NONCE_LEN {
        return Err(CipherError::TruncatedPayload(raw.len()));
    }
    let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);

    let cipher = build_cipher(name);
    let nonce = Nonce::from_slice(nonce_bytes);
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CipherError::AeadFailure)
}
