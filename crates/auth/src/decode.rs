//! Turning a presented credential token into signed mandates.
//!
//! Signature verification is the decoder's job, not this crate's policy
//! code: [`crate::authorize`] trusts that `SignedMandate::signer` is the key
//! that actually signed the mandate.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{SignedMandate, validate_window};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MandateDecodeError {
    #[error("empty mandate token")]
    Empty,

    #[error("mandate token is not base64url: {0}")]
    Encoding(String),

    #[error("mandate token is not a JSON list of signed mandates: {0}")]
    Format(String),
}

/// Decodes the credential token carried by a request into mandates.
pub trait MandateDecoder: Send + Sync {
    fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<Vec<SignedMandate>, MandateDecodeError>;
}

/// Development decoder: the token is base64url JSON of `[SignedMandate]`.
///
/// Signer keys are taken at face value. Mandates outside their validity window
/// are dropped rather than failing the whole token.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnverifiedMandateDecoder;

impl UnverifiedMandateDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Inverse of [`MandateDecoder::decode`] for this decoder.
    pub fn encode(mandates: &[SignedMandate]) -> Result<String, MandateDecodeError> {
        let json =
            serde_json::to_vec(mandates).map_err(|e| MandateDecodeError::Format(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }
}

impl MandateDecoder for UnverifiedMandateDecoder {
    fn decode(&self, token: &str, now: DateTime<Utc>) -> Result<Vec<SignedMandate>, MandateDecodeError> {
        let token = token.trim().trim_end_matches('=');
        if token.is_empty() {
            return Err(MandateDecodeError::Empty);
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| MandateDecodeError::Encoding(e.to_string()))?;
        let mandates: Vec<SignedMandate> =
            serde_json::from_slice(&bytes).map_err(|e| MandateDecodeError::Format(e.to_string()))?;

        Ok(mandates
            .into_iter()
            .filter(|m| match validate_window(&m.mandate, now) {
                Ok(()) => true,
                Err(e) => {
                    tracing::debug!(role = %m.role(), "dropping mandate: {e}");
                    false
                }
            })
            .collect())
    }
}
