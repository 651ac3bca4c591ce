//! Local development cipher backend.
//!
//! Provides deterministic-key symmetric encryption without a KMS so that
//! development and test environments can run unchanged. The key is derived
//! from the key name alone, which offers **no real security** — every call
//! emits [`cipher::DEV_WARNING`] through `tracing`.
//!
//! # Payload format
//!
//! ```text
//! base64(nonce ‖ ciphertext+tag)
//! ```
//!
//! The payload carries no version segment; the caller wraps it in the
//! uniform `vault:v0:` envelope.

pub mod cipher;

pub use cipher::{open, seal, CipherError};
