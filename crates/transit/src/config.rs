//! Configuration loading and validation for the transit façade.
//!
//! All values are read from `VAULT_*` environment variables. The defaults
//! select the local development cipher (`enabled = false`), so a process
//! with no configuration at all still encrypts and decrypts.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::retry::{RetrySettings, DEFAULT_RETRY_ATTEMPTS};

/// Validated transit configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TransitConfig {
    /// Whether operations are backed by the remote KMS. When `false` (the
    /// default) the local development cipher is used and no network access
    /// is attempted.
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of the KMS HTTP API.
    #[serde(default = "default_address")]
    pub address: String,

    /// Authentication token sent with every KMS request. **Required when
    /// `enabled` is set.**
    #[serde(default)]
    pub token: String,

    /// Maximum retries for a failed KMS call. `0` selects the library
    /// default of [`DEFAULT_RETRY_ATTEMPTS`].
    #[serde(default)]
    pub retry_attempts: u32,

    /// Base backoff delay in milliseconds, doubled per retry.
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    /// Ceiling in milliseconds for a single backoff delay.
    #[serde(default = "default_retry_max_wait_ms")]
    pub retry_max_wait_ms: u64,
}

fn default_address() -> String {
    "https://127.0.0.1:8200".into()
}
fn default_retry_base_ms() -> u64 {
    50
}
fn default_retry_max_wait_ms() -> u64 {
    2000
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: default_address(),
            token: String::new(),
            retry_attempts: 0,
            retry_base_ms: default_retry_base_ms(),
            retry_max_wait_ms: default_retry_max_wait_ms(),
        }
    }
}

impl TransitConfig {
    /// Load and validate configuration from `VAULT_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable cannot be parsed or validation fails.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::with_prefix("VAULT"))
            .build()
            .context("failed to build configuration from environment")?;

        let c: TransitConfig = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    pub fn validate(&self) -> Result<()> {
        if self.enabled {
            ensure_non_empty(&self.address, "VAULT_ADDRESS")?;
            ensure_non_empty(&self.token, "VAULT_TOKEN")?;
        }
        if self.retry_max_wait_ms < self.retry_base_ms {
            anyhow::bail!("VAULT_RETRY_MAX_WAIT_MS must be >= VAULT_RETRY_BASE_MS");
        }
        Ok(())
    }

    /// Retry parameters for the current configuration.
    ///
    /// A zero attempt count selects [`DEFAULT_RETRY_ATTEMPTS`]; any other
    /// value is literal.
    pub fn retry(&self) -> RetrySettings {
        let attempts = if self.retry_attempts == 0 {
            DEFAULT_RETRY_ATTEMPTS
        } else {
            self.retry_attempts
        };
        RetrySettings {
            attempts,
            base: Duration::from_millis(self.retry_base_ms),
            max_wait: Duration::from_millis(self.retry_max_wait_ms),
        }
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}
