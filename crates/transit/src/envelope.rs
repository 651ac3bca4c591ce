//! The versioned ciphertext envelope shared by both backends.
//!
//! # Format
//!
//! ```text
//! vault:v<version>:<payload>
//! ```
//!
//! `version` is the non-negative key version the ciphertext was produced
//! under; `payload` is backend-opaque and may itself contain `:`. The remote
//! KMS assigns versions starting at 1 and increments them on rotation; the
//! local development cipher always uses version [`LOCAL_KEY_VERSION`].
//!
//! Consumers parse on this exact delimiter scheme, so the format is
//! bit-exact: no whitespace, no alternative prefixes.

use std::fmt;

use common::TransitError;

/// Prefix at the start of every ciphertext envelope.
pub const ENVELOPE_PREFIX: &str = "vault:v";

/// Key version used for ciphertext produced by the local development cipher.
pub const LOCAL_KEY_VERSION: u64 = 0;

/// A parsed ciphertext envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Key version the ciphertext was produced under.
    pub version: u64,
    /// Backend-opaque ciphertext payload.
    pub payload: String,
}

impl Envelope {
    /// Construct an envelope from a version and payload.
    pub fn new(version: u64, payload: impl Into<String>) -> Self {
        Self {
            version,
            payload: payload.into(),
        }
    }

    /// Parse envelope text back into an [`Envelope`].
    ///
    /// # Errors
    ///
    /// Returns [`TransitError::MalformedEnvelope`] if the `vault:v` prefix is
    /// absent, the version segment is non-numeric, or the payload separator
    /// is missing.
    pub fn parse(text: &str) -> Result<Self, TransitError> {
        let rest = text.strip_prefix(ENVELOPE_PREFIX).ok_or_else(|| {
            TransitError::MalformedEnvelope(format!("missing `{ENVELOPE_PREFIX}` prefix"))
        })?;
        let (version, payload) = rest.split_once(':').ok_or_else(|| {
            TransitError::MalformedEnvelope("missing payload separator".into())
        })?;
        let version = version.parse::<u64>().map_err(|_| {
            TransitError::MalformedEnvelope(format!("non-numeric key version: {version:?}"))
        })?;
        Ok(Self {
            version,
            payload: payload.to_owned(),
        })
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ENVELOPE_PREFIX}{}:{}", self.version, self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trip() {
        let envelope = Envelope::new(3, "AbCd==");
        let text = envelope.to_string();
        assert_eq!(text, "vault:v3:AbCd==");
        assert_eq!(Envelope::parse(&text).unwrap(), envelope);
    }

    #[test]
    fn local_version_shape() {
        assert_eq!(Envelope::new(LOCAL_KEY_VERSION, "payload").to_string(), "vault:v0:payload");
    }

    #[test]
    fn payload_may_contain_separators() {
        let parsed = Envelope::parse("vault:v12:a:b:c").unwrap();
        assert_eq!(parsed.version, 12);
        assert_eq!(parsed.payload, "a:b:c");
    }

    #[test]
    fn rejects_missing_prefix() {
        assert!(matches!(
            Envelope::parse("ault:v1:xyz"),
            Err(TransitError::MalformedEnvelope(_))
        ));
        assert!(Envelope::parse("").is_err());
    }

    #[test]
    fn rejects_non_numeric_version() {
        assert!(matches!(
            Envelope::parse("vault:vX:xyz"),
            Err(TransitError::MalformedEnvelope(_))
        ));
        assert!(Envelope::parse("vault:v:xyz").is_err());
        assert!(Envelope::parse("vault:v-1:xyz").is_err());
    }

    #[test]
    fn rejects_missing_payload_separator() {
        assert!(matches!(
            Envelope::parse("vault:v1"),
            Err(TransitError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn empty_payload_is_parseable() {
        let parsed = Envelope::parse("vault:v1:").unwrap();
        assert_eq!(parsed.payload, "");
    }
}
