//! Remote transit KMS backend.
//!
//! Cryptographic operations are delegated to the KMS over the
//! [`LogicalWrite`] capability — an explicit interface listing the only two
//! operations this crate needs from a KMS client, rather than a transparent
//! proxy onto a full client object. The operation functions in this module
//! build the fixed resource paths and typed request bodies, and unwrap the
//! typed responses:
//!
//! | operation                    | path                          | body → response                     |
//! |------------------------------|-------------------------------|-------------------------------------|
//! | [`encrypt`]                  | `transit/encrypt/<key>`       | `{plaintext}` → `{data:{ciphertext}}` |
//! | [`decrypt`]                  | `transit/decrypt/<key>`       | `{ciphertext}` → `{data:{plaintext}}` |
//! | [`rewrap`]                   | `transit/rewrap/<key>`        | `{ciphertext}` → `{data:{ciphertext}}` |
//! | [`rotate`]                   | `transit/keys/<key>/rotate`   | empty → empty                       |
//! | [`set_min_decryption_version`] | `transit/keys/<key>/config` | `{min_decryption_version}` → empty  |

pub mod http;

pub use http::HttpClient;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use common::protocol::{
    DecryptData, DecryptRequest, EncryptData, EncryptRequest, KeyConfigRequest, RewrapRequest,
    Secret,
};
use common::TransitError;

/// Operations required from the KMS client.
///
/// Implementations must be `Send + Sync` so they can be shared across async
/// tasks as `Arc<dyn LogicalWrite>`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LogicalWrite: Send + Sync {
    /// Perform a logical write of `body` at `path`, returning the response
    /// body if the KMS sent one.
    ///
    /// # Errors
    ///
    /// [`TransitError::RemoteUnavailable`] for transport-level failures,
    /// [`TransitError::RemoteServerError`] for KMS-side failures, and
    /// [`TransitError::RemoteRejected`] for any other KMS-reported failure.
    async fn write(
        &self,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>, TransitError>;

    /// Mount a secrets engine of `engine_type` at `path`.
    async fn mount(&self, path: &str, engine_type: &str) -> Result<(), TransitError>;
}

/// Encrypt base64 plaintext under `key`, returning the ciphertext envelope
/// exactly as the KMS produced it.
pub async fn encrypt(
    client: &dyn LogicalWrite,
    key: &str,
    plaintext_b64: &str,
) -> Result<String, TransitError> {
    let body = request_body(&EncryptRequest {
        plaintext: plaintext_b64.to_owned(),
    })?;
    let resp = client
        .write(&format!("transit/encrypt/{key}"), Some(body))
        .await?;
    let data: EncryptData = response_data(resp, "encrypt")?;
    Ok(data.ciphertext)
}

/// Decrypt a ciphertext envelope under `key`, returning base64 plaintext.
pub async fn decrypt(
    client: &dyn LogicalWrite,
    key: &str,
    ciphertext: &str,
) -> Result<String, TransitError> {
    let body = request_body(&DecryptRequest {
        ciphertext: ciphertext.to_owned(),
    })?;
    let resp = client
        .write(&format!("transit/decrypt/{key}"), Some(body))
        .await?;
    let data: DecryptData = response_data(resp, "decrypt")?;
    Ok(data.plaintext)
}

/// Re-encrypt an existing envelope under the current version of `key`
/// without exposing the plaintext.
pub async fn rewrap(
    client: &dyn LogicalWrite,
    key: &str,
    ciphertext: &str,
) -> Result<String, TransitError> {
    let body = request_body(&RewrapRequest {
        ciphertext: ciphertext.to_owned(),
    })?;
    let resp = client
        .write(&format!("transit/rewrap/{key}"), Some(body))
        .await?;
    let data: EncryptData = response_data(resp, "rewrap")?;
    Ok(data.ciphertext)
}

/// Advance `key` to its next version. Future encryptions use the new
/// version; existing ciphertext stays decryptable down to the key's minimum
/// decryption version.
pub async fn rotate(client: &dyn LogicalWrite, key: &str) -> Result<(), TransitError> {
    client
        .write(&format!("transit/keys/{key}/rotate"), None)
        .await?;
    Ok(())
}

/// Raise the minimum decryption version of `key`. Envelopes produced by
/// older versions are rejected by the KMS from then on.
pub async fn set_min_decryption_version(
    client: &dyn LogicalWrite,
    key: &str,
    version: u64,
) -> Result<(), TransitError> {
    let body = request_body(&KeyConfigRequest {
        min_decryption_version: version,
    })?;
    client
        .write(&format!("transit/keys/{key}/config"), Some(body))
        .await?;
    Ok(())
}

fn request_body<T: Serialize>(body: &T) -> Result<Value, TransitError> {
    serde_json::to_value(body)
        .map_err(|e| TransitError::UnexpectedResponse(format!("request body serialisation failed: {e}")))
}

fn response_data<T: DeserializeOwned>(
    resp: Option<Value>,
    operation: &str,
) -> Result<T, TransitError> {
    let value = resp.ok_or_else(|| {
        TransitError::UnexpectedResponse(format!("{operation}: empty response body"))
    })?;
    let secret: Secret<T> = serde_json::from_value(value)
        .map_err(|e| TransitError::UnexpectedResponse(format!("{operation}: {e}")))?;
    Ok(secret.data)
}
