//! Common error types shared across crates.

use thiserror::Error;

/// Top-level error type for all transit operations.
///
/// The retry policy classifies failures with [`TransitError::is_retryable`]:
/// - [`TransitError::RemoteUnavailable`] → retried (transport-level failure)
/// - [`TransitError::RemoteServerError`] → retried (KMS-side 5xx failure)
/// - everything else → surfaced immediately, never retried
#[derive(Debug, Error)]
pub enum TransitError {
    /// Ciphertext does not match the `vault:v<version>:<payload>` grammar.
    #[error("malformed ciphertext envelope: {0}")]
    MalformedEnvelope(String),

    /// The KMS could not be reached at the transport level.
    #[error("KMS unavailable: {0}")]
    RemoteUnavailable(String),

    /// The KMS responded with a server-side failure (HTTP 5xx).
    #[error("KMS server error (status {status}): {message}")]
    RemoteServerError {
        /// HTTP status code reported by the KMS.
        status: u16,
        /// Failure description extracted from the response body.
        message: String,
    },

    /// The KMS rejected the request (bad key name, auth failure, not-found,
    /// or a version constraint violation).
    #[error("KMS rejected request (status {status}): {message}")]
    RemoteRejected {
        /// HTTP status code reported by the KMS.
        status: u16,
        /// Rejection description extracted from the response body.
        message: String,
    },

    /// A KMS response was syntactically valid but missing the expected data.
    #[error("unexpected KMS response: {0}")]
    UnexpectedResponse(String),

    /// The local development cipher failed (bad payload or key mismatch).
    #[error("cipher failure: {0}")]
    Cipher(String),

    /// Decrypted plaintext is not valid UTF-8.
    #[error("decrypted plaintext is not valid UTF-8")]
    Encoding(#[from] std::string::FromUtf8Error),
}

impl TransitError {
    /// Returns `true` if the retry policy should re-attempt the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransitError::RemoteUnavailable(_) | TransitError::RemoteServerError { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_failures_are_retryable() {
        assert!(TransitError::RemoteUnavailable("connection refused".into()).is_retryable());
        assert!(TransitError::RemoteServerError {
            status: 502,
            message: "bad gateway".into(),
        }
        .is_retryable());
    }

    #[test]
    fn rejections_are_not_retryable() {
        assert!(!TransitError::RemoteRejected {
            status: 403,
            message: "permission denied".into(),
        }
        .is_retryable());
        assert!(!TransitError::MalformedEnvelope("no prefix".into()).is_retryable());
        assert!(!TransitError::Cipher("auth failed".into()).is_retryable());
        assert!(!TransitError::UnexpectedResponse("missing data".into()).is_retryable());
    }

    #[test]
    fn display_includes_message() {
        let e = TransitError::RemoteRejected {
            status: 404,
            message: "encryption key not found".into(),
        };
        assert!(e.to_string().contains("encryption key not found"));
        assert!(e.to_string().contains("404"));
    }
}
