//! Hyper-based [`LogicalWrite`] implementation speaking the KMS HTTP API.
//!
//! Logical writes become `POST /v1/<path>` requests authenticated with the
//! configured token in the `X-Vault-Token` header. Failure classification:
//!
//! - transport errors (connect, TLS, truncated body) → `RemoteUnavailable`
//! - HTTP 5xx → `RemoteServerError`
//! - any other non-2xx → `RemoteRejected`
//!
//! The `{"errors": [...]}` body the KMS attaches to failures is folded into
//! the error message.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{header, Method, Request, Uri};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use serde_json::Value;

use common::protocol::ErrorResponse;
use common::TransitError;

use super::LogicalWrite;
use crate::config::TransitConfig;

/// KMS client over HTTP(S).
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Clone)]
pub struct HttpClient {
    http: Client<HttpsConnector<HttpConnector>, Full<Bytes>>,
    address: String,
    token: String,
}

impl HttpClient {
    /// Build a client for the configured KMS address.
    ///
    /// TLS uses webpki roots with the ring provider; plain `http://`
    /// addresses are accepted for development setups.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS configuration cannot be initialised or
    /// the address is not a valid URI base.
    pub fn new(cfg: &TransitConfig) -> Result<Self> {
        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())
            .context("failed to initialise TLS configuration")?
            .https_or_http()
            .enable_http1()
            .build();

        let address = cfg.address.trim_end_matches('/').to_owned();
        address
            .parse::<Uri>()
            .context("KMS address is not a valid URI")?;

        Ok(Self {
            http: Client::builder(TokioExecutor::new()).build(https),
            address,
            token: cfg.token.clone(),
        })
    }

    async fn post(&self, path: &str, body: Option<Vec<u8>>) -> Result<Option<Value>, TransitError> {
        let uri = format!("{}/v1/{path}", self.address);
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri.as_str())
            .header("X-Vault-Token", self.token.as_str());
        if body.is_some() {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
        }
        let request = builder
            .body(Full::new(Bytes::from(body.unwrap_or_default())))
            .map_err(|e| TransitError::RemoteUnavailable(format!("invalid request for {uri}: {e}")))?;

        let response = self
            .http
            .request(request)
            .await
            .map_err(|e| TransitError::RemoteUnavailable(e.to_string()))?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| TransitError::RemoteUnavailable(format!("failed to read response body: {e}")))?
            .to_bytes();

        if status.is_success() {
            if body.is_empty() {
                return Ok(None);
            }
            let value: Value = serde_json::from_slice(&body).map_err(|e| {
                TransitError::UnexpectedResponse(format!("response is not valid JSON: {e}"))
            })?;
            return Ok(Some(value));
        }

        let message = error_message(&body);
        if status.is_server_error() {
            Err(TransitError::RemoteServerError {
                status: status.as_u16(),
                message,
            })
        } else {
            Err(TransitError::RemoteRejected {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[async_trait]
impl LogicalWrite for HttpClient {
    async fn write(
        &self,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>, TransitError> {
        let bytes = match body {
            Some(value) => Some(serde_json::to_vec(&value).map_err(|e| {
                TransitError::UnexpectedResponse(format!("request body serialisation failed: {e}"))
            })?),
            None => None,
        };
        self.post(path, bytes).await
    }

    async fn mount(&self, path: &str, engine_type: &str) -> Result<(), TransitError> {
        let body = serde_json::to_vec(&serde_json::json!({ "type": engine_type })).map_err(|e| {
            TransitError::UnexpectedResponse(format!("request body serialisation failed: {e}"))
        })?;
        self.post(&format!("sys/mounts/{path}"), Some(body)).await?;
        Ok(())
    }
}

/// Extract failure messages from an error body, falling back to raw text.
fn error_message(body: &[u8]) -> String {
    if let Ok(parsed) = serde_json::from_slice::<ErrorResponse>(body) {
        if !parsed.errors.is_empty() {
            return parsed.errors.join("; ");
        }
    }
    String::from_utf8_lossy(body).trim().to_owned()
}
