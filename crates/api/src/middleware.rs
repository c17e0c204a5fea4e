use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::Instrument;

use bindgate_auth::MandateDecoder;

use crate::app::errors::json_error;
use crate::context::{PresentedMandates, RequestContext};

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");
const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Assigns a request id, opens the request log span and echoes the id back in
/// `X-Request-Id`.
pub async fn request_context_middleware(mut req: Request, next: Next) -> Response {
    let ctx = RequestContext::new();
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let remote = client_addr(req.headers(), peer);
    let proto = forwarded_proto(req.headers())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:?}", req.version()));
    let request_size = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);

    let span = tracing::info_span!(
        "request",
        request_id = %ctx.request_id(),
        method = %req.method(),
        uri = %req.uri(),
        proto = %proto,
        request_size,
        host = header_str(req.headers(), &header::HOST),
        user_agent = header_str(req.headers(), &header::USER_AGENT),
        referer = header_str(req.headers(), &header::REFERER),
        remote = %remote,
    );

    req.extensions_mut().insert(ctx);

    let started = Instant::now();
    let mut res = next.run(req).instrument(span.clone()).await;

    span.in_scope(|| {
        tracing::info!(
            status = res.status().as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            "request completed"
        );
    });

    if let Ok(value) = HeaderValue::from_str(&ctx.request_id().to_string()) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// Client address as seen by the first proxy in front of us.
///
/// `X-Forwarded-For` (left-most entry) wins over `X-Real-IP`; the socket
/// peer is used when neither header is present.
fn client_addr(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = header_str(headers, &X_FORWARDED_FOR)
        .split(',')
        .next()
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = Some(header_str(headers, &X_REAL_IP).trim()).filter(|v| !v.is_empty());

    match forwarded.or(real_ip) {
        Some(addr) => addr.to_string(),
        None => peer.map(|p| p.to_string()).unwrap_or_default(),
    }
}

fn forwarded_proto(headers: &HeaderMap) -> Option<&str> {
    Some(header_str(headers, &X_FORWARDED_PROTO).trim()).filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct MandateState {
    pub decoder: Arc<dyn MandateDecoder>,
}

/// Decodes the bearer token into mandates and makes them available to
/// authenticated request shapes.
pub async fn mandate_middleware(
    State(state): State<MandateState>,
    mut req: Request,
    next: Next,
) -> Response {
    let token = match extract_bearer(req.headers()) {
        Ok(token) => token,
        Err(msg) => return json_error(StatusCode::UNAUTHORIZED, "unauthorized", msg),
    };

    let mandates = match state.decoder.decode(token, Utc::now()) {
        Ok(mandates) => mandates,
        Err(e) => {
            tracing::warn!(error = %e, "rejected mandate token");
            return json_error(StatusCode::UNAUTHORIZED, "unauthorized", e.to_string());
        }
    };

    tracing::debug!(presented = mandates.len(), "mandates decoded");
    req.extensions_mut()
        .insert(PresentedMandates::new(mandates));

    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, &'static str> {
    let header = headers
        .get(header::AUTHORIZATION)
        .ok_or("missing authorization header")?;

    let header = header
        .to_str()
        .map_err(|_| "authorization header is not valid text")?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or("authorization header is not a bearer token")?
        .trim();

    if token.is_empty() {
        return Err("empty bearer token");
    }

    Ok(token)
}
