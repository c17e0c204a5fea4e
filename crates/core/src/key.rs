//! Public keys (JWK) and their thumbprints.
//!
//! Realms and mandate signers are identified by public keys. Identity
//! comparison never looks at the key material directly; it compares
//! thumbprints computed over the canonical form of the key's required members
//! (RFC 7638), so metadata such as `kid` or `alg` never affects identity.

use std::collections::BTreeMap;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{DomainError, DomainResult};

/// Public key in JSON Web Key form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    pub kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
}

impl PublicKey {
    fn bare(kty: &str) -> Self {
        Self {
            kty: kty.to_string(),
            crv: None,
            x: None,
            y: None,
            n: None,
            e: None,
            k: None,
            kid: None,
            alg: None,
        }
    }

    /// Elliptic-curve key (`kty = "EC"`).
    pub fn ec(crv: impl Into<String>, x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            crv: Some(crv.into()),
            x: Some(x.into()),
            y: Some(y.into()),
            ..Self::bare("EC")
        }
    }

    /// Octet key pair (`kty = "OKP"`, e.g. Ed25519).
    pub fn okp(crv: impl Into<String>, x: impl Into<String>) -> Self {
        Self {
            crv: Some(crv.into()),
            x: Some(x.into()),
            ..Self::bare("OKP")
        }
    }

    /// RSA key (`kty = "RSA"`).
    pub fn rsa(n: impl Into<String>, e: impl Into<String>) -> Self {
        Self {
            n: Some(n.into()),
            e: Some(e.into()),
            ..Self::bare("RSA")
        }
    }

    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// Thumbprint of this key. See [`Thumbprint::of`].
    pub fn thumbprint(&self) -> DomainResult<Thumbprint> {
        Thumbprint::of(self)
    }

    /// Required members for the key type, keyed by member name.
    ///
    /// `BTreeMap` keeps the lexicographic member order the canonical form needs.
    fn required_members(&self) -> DomainResult<BTreeMap<&'static str, &str>> {
        let mut members = BTreeMap::new();
        members.insert("kty", self.kty.as_str());

        let names: &[&'static str] = match self.kty.as_str() {
            "EC" => &["crv", "x", "y"],
            "OKP" => &["crv", "x"],
            "RSA" => &["e", "n"],
            "oct" => &["k"],
            other => {
                return Err(DomainError::invalid_key(format!(
                    "unsupported key type '{other}'"
                )));
            }
        };

        for name in names {
            let value = self.member(name).ok_or_else(|| {
                DomainError::invalid_key(format!("{} key is missing member '{name}'", self.kty))
            })?;
            members.insert(*name, value);
        }

        Ok(members)
    }

    fn member(&self, name: &str) -> Option<&str> {
        let value = match name {
            "crv" => &self.crv,
            "x" => &self.x,
            "y" => &self.y,
            "n" => &self.n,
            "e" => &self.e,
            "k" => &self.k,
            _ => return None,
        };
        value.as_deref()
    }
}

/// Deterministic fingerprint of a [`PublicKey`].
///
/// Base64url (no padding) of the SHA-256 digest of the canonical JSON of the
/// key's required members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Thumbprint(String);

impl Thumbprint {
    pub fn of(key: &PublicKey) -> DomainResult<Self> {
        let members = key.required_members()?;
        let canonical =
            serde_json::to_vec(&members).map_err(|e| DomainError::invalid_key(e.to_string()))?;
        let digest = Sha256::digest(&canonical);
        Ok(Self(URL_SAFE_NO_PAD.encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Thumbprint {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
