//! The transit façade: backend dispatch, envelope handling, and retries.

use std::sync::Arc;

use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use base64::{engine::general_purpose::STANDARD, Engine as _};

use common::TransitError;

use crate::config::TransitConfig;
use crate::crypto;
use crate::envelope::{Envelope, LOCAL_KEY_VERSION};
use crate::kms::{self, HttpClient, LogicalWrite};
use crate::retry::with_retries;

/// Entry point for all transit operations.
///
/// Each call dispatches to the remote KMS backend (configuration `enabled`)
/// or to the local development cipher (the default). The configuration is
/// read fresh on every call and can be replaced at runtime with
/// [`Transit::configure`]. Remote calls are wrapped in the retry policy;
/// the local branch never retries.
///
/// Cloning is cheap — all state is shared behind `Arc`s.
#[derive(Clone)]
pub struct Transit {
    config: Arc<ArcSwap<TransitConfig>>,
    client: Arc<dyn LogicalWrite>,
}

impl Transit {
    /// Create a façade over an explicit KMS client capability.
    pub fn new(config: TransitConfig, client: Arc<dyn LogicalWrite>) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            client,
        }
    }

    /// Build from `VAULT_*` environment variables, with an [`HttpClient`]
    /// bound to the configured address.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading/validation fails or the
    /// HTTP client cannot be constructed.
    pub fn from_env() -> Result<Self> {
        let config = TransitConfig::from_env()?;
        let client = HttpClient::new(&config).context("failed to build KMS HTTP client")?;
        Ok(Self::new(config, Arc::new(client)))
    }

    /// Replace the live configuration.
    ///
    /// Takes effect for every call made after the swap, including the
    /// `enabled` backend selection.
    pub fn configure(&self, config: TransitConfig) {
        self.config.store(Arc::new(config));
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> Arc<TransitConfig> {
        self.config.load_full()
    }

    /// Encrypt `plaintext` under the named key, returning a
    /// `vault:v<N>:<payload>` envelope.
    ///
    /// An empty `plaintext` is returned unchanged without invoking either
    /// backend. This is a defined success, indistinguishable from
    /// encrypting the empty string — surprising for security-sensitive
    /// callers, but part of the contract.
    pub async fn encrypt(&self, key: &str, plaintext: &str) -> Result<String, TransitError> {
        if plaintext.is_empty() {
            return Ok(plaintext.to_owned());
        }
        let cfg = self.config.load_full();
        if cfg.enabled {
            let encoded = STANDARD.encode(plaintext.as_bytes());
            with_retries(cfg.retry(), || {
                let client = Arc::clone(&self.client);
                let key = key.to_owned();
                let encoded = encoded.clone();
                async move { kms::encrypt(client.as_ref(), &key, &encoded).await }
            })
            .await
        } else {
            let payload = crypto::seal(key, plaintext.as_bytes())?;
            Ok(Envelope::new(LOCAL_KEY_VERSION, payload).to_string())
        }
    }

    /// Decrypt a ciphertext envelope under the named key.
    ///
    /// An empty `ciphertext` is returned unchanged without invoking either
    /// backend.
    pub async fn decrypt(&self, key: &str, ciphertext: &str) -> Result<String, TransitError> {
        if ciphertext.is_empty() {
            return Ok(ciphertext.to_owned());
        }
        let cfg = self.config.load_full();
        if cfg.enabled {
            let encoded = with_retries(cfg.retry(), || {
                let client = Arc::clone(&self.client);
                let key = key.to_owned();
                let ciphertext = ciphertext.to_owned();
                async move { kms::decrypt(client.as_ref(), &key, &ciphertext).await }
            })
            .await?;
            let raw = STANDARD.decode(encoded.as_bytes()).map_err(|e| {
                TransitError::UnexpectedResponse(format!("plaintext is not valid base64: {e}"))
            })?;
            Ok(String::from_utf8(raw)?)
        } else {
            let envelope = Envelope::parse(ciphertext)?;
            let raw = crypto::open(key, &envelope.payload)?;
            Ok(String::from_utf8(raw)?)
        }
    }

    /// Re-encrypt an existing envelope under the key's current version
    /// without exposing the plaintext.
    ///
    /// An empty `ciphertext` is returned unchanged. When disabled this is a
    /// no-op returning the input — the local cipher has no key versions to
    /// rewrap against.
    pub async fn rewrap(&self, key: &str, ciphertext: &str) -> Result<String, TransitError> {
        if ciphertext.is_empty() {
            return Ok(ciphertext.to_owned());
        }
        let cfg = self.config.load_full();
        if cfg.enabled {
            with_retries(cfg.retry(), || {
                let client = Arc::clone(&self.client);
                let key = key.to_owned();
                let ciphertext = ciphertext.to_owned();
                async move { kms::rewrap(client.as_ref(), &key, &ciphertext).await }
            })
            .await
        } else {
            Ok(ciphertext.to_owned())
        }
    }

    /// Advance the named key to its next version.
    ///
    /// When disabled this is a no-op — the local cipher has no key-version
    /// state to advance.
    pub async fn rotate(&self, key: &str) -> Result<(), TransitError> {
        let cfg = self.config.load_full();
        if !cfg.enabled {
            return Ok(());
        }
        with_retries(cfg.retry(), || {
            let client = Arc::clone(&self.client);
            let key = key.to_owned();
            async move { kms::rotate(client.as_ref(), &key).await }
        })
        .await
    }

    /// Raise the minimum decryption version for the named key. Envelopes
    /// produced by older key versions are rejected by the KMS from then on.
    ///
    /// When disabled this is a no-op.
    pub async fn set_min_decryption_version(
        &self,
        key: &str,
        version: u64,
    ) -> Result<(), TransitError> {
        let cfg = self.config.load_full();
        if !cfg.enabled {
            return Ok(());
        }
        with_retries(cfg.retry(), || {
            let client = Arc::clone(&self.client);
            let key = key.to_owned();
            async move { kms::set_min_decryption_version(client.as_ref(), &key, version).await }
        })
        .await
    }

    /// Mount the transit secrets engine at its fixed path.
    ///
    /// Intended for development and test bootstrap. No-op when disabled.
    pub async fn mount_transit(&self) -> Result<(), TransitError> {
        let cfg = self.config.load_full();
        if !cfg.enabled {
            return Ok(());
        }
        self.client.mount("transit", "transit").await
    }
}
