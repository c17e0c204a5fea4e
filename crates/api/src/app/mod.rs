//! HTTP application wiring (Axum router + layers).
//!
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, http::header, Extension, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
};

use bindgate_auth::MandateDecoder;
use bindgate_infra::BindingStore;

use crate::config::{ApiConfig, CorsConfig};
use crate::middleware;
use crate::request::MAX_BODY_BYTES;

pub mod dto;
pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(
    config: &ApiConfig,
    store: Arc<dyn BindingStore>,
    decoder: Arc<dyn MandateDecoder>,
) -> anyhow::Result<Router> {
    let mandate_state = middleware::MandateState { decoder };

    // Authenticated routes: callers must present mandates.
    let authenticated = routes::authenticated_router().route_layer(axum::middleware::from_fn_with_state(
        mandate_state,
        middleware::mandate_middleware,
    ));

    Ok(Router::new()
        .merge(routes::public_router())
        .merge(authenticated)
        .layer(Extension(store))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::SERVER,
                    config.server_header()?,
                ))
                .layer(axum::middleware::from_fn(middleware::request_context_middleware))
                .layer(cors_layer(&config.cors)),
        ))
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(AllowHeaders::list(cors.allowed_headers.iter().cloned()))
        .allow_methods(AllowMethods::list(cors.allowed_methods.iter().cloned()))
}
