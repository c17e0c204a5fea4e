//! Process configuration, read from the environment.
//!
//! | variable                        | default                                  |
//! |---------------------------------|------------------------------------------|
//! | `BINDGATE_ADDR`                 | `0.0.0.0:8080`                           |
//! | `BINDGATE_BINDINGS_FILE`        | unset (start with no bindings)           |
//! | `BINDGATE_CORS_ALLOWED_HEADERS` | see [`CorsConfig::default`]              |
//! | `BINDGATE_CORS_ALLOWED_METHODS` | `GET, POST, PUT, DELETE`                 |
//! | `BINDGATE_SERVER_NAME`          | `bindgate`                               |
//! | `BINDGATE_INSECURE_MANDATES`    | `false` (refuse to start)                |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::http::{HeaderName, HeaderValue, Method};

use bindgate_auth::{MandateDecoder, UnverifiedMandateDecoder};

const DEFAULT_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SERVER_NAME: &str = "bindgate";

// Lowercase so they can be used with `HeaderName::from_static`.
const DEFAULT_ALLOWED_HEADERS: &[&str] = &[
    "accept",
    "accept-language",
    "content-language",
    "content-type",
    "origin",
    "authorization",
    "x-auth-token",
];
const DEFAULT_ALLOWED_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE"];

/// Headers and methods allowed in cross-origin requests.
///
/// Passed to the router at construction time; there is no global CORS state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_headers: Vec<HeaderName>,
    pub allowed_methods: Vec<Method>,
}

impl CorsConfig {
    pub fn new(headers: &[&str], methods: &[&str]) -> anyhow::Result<Self> {
        let allowed_headers = headers
            .iter()
            .map(|h| HeaderName::try_from(h.trim()).with_context(|| format!("invalid CORS header '{h}'")))
            .collect::<anyhow::Result<_>>()?;
        let allowed_methods = methods
            .iter()
            .map(|m| Method::from_bytes(m.trim().as_bytes()).with_context(|| format!("invalid CORS method '{m}'")))
            .collect::<anyhow::Result<_>>()?;

        Ok(Self {
            allowed_headers,
            allowed_methods,
        })
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_headers: DEFAULT_ALLOWED_HEADERS
                .iter()
                .map(|h| HeaderName::from_static(*h))
                .collect(),
            allowed_methods: vec![Method::GET, Method::POST, Method::PUT, Method::DELETE],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub addr: SocketAddr,
    pub bindings_file: Option<PathBuf>,
    pub cors: CorsConfig,
    pub server_name: String,
    /// Accept mandates whose signatures have not been verified.
    pub insecure_mandates: bool,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let addr = lookup("BINDGATE_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr: SocketAddr = addr
            .parse()
            .with_context(|| format!("BINDGATE_ADDR is not a socket address: '{addr}'"))?;

        let bindings_file = lookup("BINDGATE_BINDINGS_FILE")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let cors = match (
            lookup("BINDGATE_CORS_ALLOWED_HEADERS"),
            lookup("BINDGATE_CORS_ALLOWED_METHODS"),
        ) {
            (None, None) => CorsConfig::default(),
            (headers, methods) => {
                let headers = headers.map(|h| split_list(&h));
                let methods = methods.map(|m| split_list(&m));
                let headers: Vec<&str> = match &headers {
                    Some(list) => list.iter().map(String::as_str).collect(),
                    None => DEFAULT_ALLOWED_HEADERS.to_vec(),
                };
                let methods: Vec<&str> = match &methods {
                    Some(list) => list.iter().map(String::as_str).collect(),
                    None => DEFAULT_ALLOWED_METHODS.to_vec(),
                };
                CorsConfig::new(&headers, &methods)?
            }
        };

        let server_name = lookup("BINDGATE_SERVER_NAME")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_NAME.to_string());

        let insecure_mandates = match lookup("BINDGATE_INSECURE_MANDATES") {
            Some(raw) => parse_flag(&raw)
                .with_context(|| format!("BINDGATE_INSECURE_MANDATES is not a boolean: '{raw}'"))?,
            None => false,
        };

        Ok(Self {
            addr,
            bindings_file,
            cors,
            server_name,
            insecure_mandates,
        })
    }

    /// Value of the `Server` response header: `<name>/<version>`.
    pub fn server_header(&self) -> anyhow::Result<HeaderValue> {
        let value = format!("{}/{}", self.server_name, env!("CARGO_PKG_VERSION"));
        HeaderValue::from_str(&value).with_context(|| format!("invalid Server header '{value}'"))
    }

    /// Decoder for bearer mandate tokens.
    ///
    /// The only available decoder trusts signer keys as presented, so it has to
    /// be enabled with `BINDGATE_INSECURE_MANDATES`.
    pub fn mandate_decoder(&self) -> anyhow::Result<Arc<dyn MandateDecoder>> {
        if !self.insecure_mandates {
            anyhow::bail!(
                "no verifying mandate decoder is available; \
                 set BINDGATE_INSECURE_MANDATES=1 to accept unverified mandates"
            );
        }
        Ok(Arc::new(UnverifiedMandateDecoder::new()))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            bindings_file: None,
            cors: CorsConfig::default(),
            server_name: DEFAULT_SERVER_NAME.to_string(),
            insecure_mandates: false,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "" | "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
