use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bindgate_core::PublicKey;

use crate::Role;

/// Mandate payload: the role being asserted plus optional metadata.
///
/// Only `role` takes part in authorization decisions. The validity window is
/// enforced by whoever decodes mandates (see [`validate_window`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mandate {
    pub role: Role,

    /// Human-readable name of the role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,

    /// Key the mandate was issued to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<PublicKey>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

impl Mandate {
    pub fn new(role: impl Into<Role>) -> Self {
        Self {
            role: role.into(),
            role_name: None,
            valid_from: None,
            valid_until: None,
            recipient: None,
            params: BTreeMap::new(),
        }
    }

    pub fn valid_between(mut self, from: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        self.valid_from = Some(from);
        self.valid_until = Some(until);
        self
    }
}

/// A mandate together with the key that signed it.
///
/// The signature itself has already been checked upstream; `signer` is the
/// key that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedMandate {
    pub signer: PublicKey,
    pub mandate: Mandate,
}

impl SignedMandate {
    pub fn new(signer: PublicKey, mandate: Mandate) -> Self {
        Self { signer, mandate }
    }

    pub fn role(&self) -> &Role {
        &self.mandate.role
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MandateWindowError {
    #[error("mandate has expired")]
    Expired,

    #[error("mandate not yet valid (valid_from is in the future)")]
    NotYetValid,

    #[error("invalid mandate time window (valid_until <= valid_from)")]
    InvalidTimeWindow,
}

/// Deterministically validate a mandate's validity window at `now`.
///
/// Missing bounds are open-ended.
pub fn validate_window(mandate: &Mandate, now: DateTime<Utc>) -> Result<(), MandateWindowError> {
    if let (Some(from), Some(until)) = (mandate.valid_from, mandate.valid_until) {
        if until <= from {
            return Err(MandateWindowError::InvalidTimeWindow);
        }
    }
    if let Some(from) = mandate.valid_from {
        if now < from {
            return Err(MandateWindowError::NotYetValid);
        }
    }
    if let Some(until) = mandate.valid_until {
        if now >= until {
            return Err(MandateWindowError::Expired);
        }
    }
    Ok(())
}
