//! Request shapes handed to binding-aware handlers.
//!
//! - `PlainRequest`: method, uri, headers, query parameters and buffered body
//! - `AuthenticatedRequest`: a plain request plus the presented mandates
//! - `ActionRequest`: an authenticated request whose body is an [`Action`]
//!
//! Each richer shape composes the previous one and derefs to it.

use std::collections::HashMap;
use std::ops::Deref;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Query, Request},
    http::{request::Parts, HeaderMap, Method, StatusCode, Uri},
    response::Response,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bindgate_auth::SignedMandate;

use crate::app::errors::json_error;
use crate::context::{PresentedMandates, RequestContext};

/// Upper bound for buffered request bodies, installed as the router's
/// `DefaultBodyLimit`.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Basic inbound request.
#[derive(Debug, Clone)]
pub struct PlainRequest {
    id: Uuid,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    query: HashMap<String, String>,
    body: Bytes,
}

impl PlainRequest {
    pub fn from_parts(parts: &Parts, body: Bytes) -> Self {
        let id = parts
            .extensions
            .get::<RequestContext>()
            .copied()
            .unwrap_or_default()
            .request_id();

        Self {
            id,
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            headers: parts.headers.clone(),
            query: parse_query(&parts.uri),
            body,
        }
    }

    /// Request id (shared with the log span of this request).
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// First occurrence wins for repeated keys; malformed queries read as empty.
fn parse_query(uri: &Uri) -> HashMap<String, String> {
    let pairs = Query::<Vec<(String, String)>>::try_from_uri(uri)
        .map(|Query(pairs)| pairs)
        .unwrap_or_default();

    let mut query = HashMap::with_capacity(pairs.len());
    for (key, value) in pairs {
        query.entry(key).or_insert(value);
    }
    query
}

#[async_trait]
impl<S> FromRequest<S> for PlainRequest
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let mut plain = Self::from_parts(&parts, Bytes::new());

        plain.body = Bytes::from_request(Request::from_parts(parts, body), state)
            .await
            .map_err(|rejection| {
                let status = rejection.status();
                let code = if status == StatusCode::PAYLOAD_TOO_LARGE {
                    "payload_too_large"
                } else {
                    "invalid_body"
                };
                json_error(status, code, rejection.body_text())
            })?;
        Ok(plain)
    }
}

/// Request carrying the mandates the caller presented.
///
/// Mandate signatures have already been checked by the decoder that produced
/// them; binding-level checks happen when a binding is attached.
#[derive(Debug, Clone)]
pub struct AuthenticatedRequest {
    request: PlainRequest,
    mandates: Vec<SignedMandate>,
}

impl AuthenticatedRequest {
    pub fn new(request: PlainRequest, mandates: Vec<SignedMandate>) -> Self {
        Self { request, mandates }
    }

    pub fn mandates(&self) -> &[SignedMandate] {
        &self.mandates
    }
}

impl Deref for AuthenticatedRequest {
    type Target = PlainRequest;

    fn deref(&self) -> &PlainRequest {
        &self.request
    }
}

#[async_trait]
impl<S> FromRequest<S> for AuthenticatedRequest
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(mut req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mandates = req
            .extensions_mut()
            .remove::<PresentedMandates>()
            .ok_or_else(|| json_error(StatusCode::UNAUTHORIZED, "unauthorized", "no mandates presented"))?;

        let request = PlainRequest::from_request(req, state).await?;
        Ok(Self::new(request, mandates.into_inner()))
    }
}

/// Structured operation carried in the body of an action request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type", default)]
    pub action_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<HashMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

impl Action {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.as_ref()?.get(name).map(String::as_str)
    }
}

/// Authenticated request whose body is an [`Action`].
#[derive(Debug, Clone)]
pub struct ActionRequest {
    request: AuthenticatedRequest,
    action: Action,
}

impl ActionRequest {
    pub fn new(request: AuthenticatedRequest, action: Action) -> Self {
        Self { request, action }
    }

    pub fn action(&self) -> &Action {
        &self.action
    }
}

impl Deref for ActionRequest {
    type Target = AuthenticatedRequest;

    fn deref(&self) -> &AuthenticatedRequest {
        &self.request
    }
}

#[async_trait]
impl<S> FromRequest<S> for ActionRequest
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let request = AuthenticatedRequest::from_request(req, state).await?;
        let action: Action = serde_json::from_slice(request.body())
            .map_err(|e| json_error(StatusCode::BAD_REQUEST, "invalid_action", e.to_string()))?;
        Ok(Self::new(request, action))
    }
}
