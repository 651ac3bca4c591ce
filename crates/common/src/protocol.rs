//! Request and response bodies exchanged with the transit KMS.
//!
//! These types are serialised as JSON and written to the KMS resource paths
//! (`transit/encrypt/<key>`, `transit/decrypt/<key>`, …). Successful
//! responses wrap their payload in a `data` object, mirrored by [`Secret`].

use serde::{Deserialize, Serialize};

/// Generic wrapper around the `data` object of a successful KMS response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Secret<T> {
    /// The operation-specific response payload.
    pub data: T,
}

// ---------------------------------------------------------------------------
// Encrypt
// ---------------------------------------------------------------------------

/// Request body for `transit/encrypt/<key>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptRequest {
    /// Base64-encoded plaintext to encrypt.
    pub plaintext: String,
}

/// `data` payload of an encrypt (or rewrap) response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptData {
    /// Ciphertext envelope, `vault:v<version>:<payload>`.
    pub ciphertext: String,
}

// ---------------------------------------------------------------------------
// Decrypt
// ---------------------------------------------------------------------------

/// Request body for `transit/decrypt/<key>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptRequest {
    /// Ciphertext envelope to decrypt.
    pub ciphertext: String,
}

/// `data` payload of a decrypt response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptData {
    /// Base64-encoded decrypted plaintext.
    pub plaintext: String,
}

// ---------------------------------------------------------------------------
// Rewrap
// ---------------------------------------------------------------------------

/// Request body for `transit/rewrap/<key>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewrapRequest {
    /// Ciphertext envelope to re-encrypt under the current key version.
    pub ciphertext: String,
}

// ---------------------------------------------------------------------------
// Key configuration
// ---------------------------------------------------------------------------

/// Request body for `transit/keys/<key>/config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyConfigRequest {
    /// Ciphertext produced by key versions below this threshold can no
    /// longer be decrypted or rewrapped.
    pub min_decryption_version: u64,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Error body returned by the KMS on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable failure descriptions.
    #[serde(default)]
    pub errors: Vec<String>,
}
