//! Encryption-as-a-service façade over a transit KMS.
//!
//! Exposes `encrypt`, `decrypt`, `rewrap`, `rotate`, and
//! `set_min_decryption_version`, keyed by a named cryptographic key. When
//! enabled, operations are delegated to the KMS through the
//! [`LogicalWrite`] capability with bounded exponential-backoff retries;
//! when disabled (the default), a local development cipher provides the
//! same versioned `vault:v<N>:<payload>` envelope without network access.
//!
//! ```no_run
//! # async fn demo() -> anyhow::Result<()> {
//! let transit = transit::Transit::from_env()?;
//! let ciphertext = transit.encrypt("orders", "4111-1111-1111-1111").await?;
//! let plaintext = transit.decrypt("orders", &ciphertext).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod crypto;
pub mod envelope;
pub mod kms;
pub mod retry;

pub use client::Transit;
pub use common::TransitError;
pub use config::TransitConfig;
pub use envelope::Envelope;
pub use kms::{HttpClient, LogicalWrite};
pub use retry::RetrySettings;
