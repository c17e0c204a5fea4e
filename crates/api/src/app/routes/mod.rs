use axum::{
    routing::{get, post},
    Router,
};

pub mod binding;
pub mod system;

/// Routes that need no presented mandates.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/binding", get(binding::show_binding))
}

/// Routes behind the mandate middleware.
pub fn authenticated_router() -> Router {
    Router::new()
        .route("/binding/admin", get(binding::admin_binding))
        .route("/binding/actions", post(binding::run_action))
}
