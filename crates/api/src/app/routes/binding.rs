//! Binding-scoped endpoints, one per request shape.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use bindgate_core::Entity;

use crate::app::dto::{BindingView, PresentedMandateView};
use crate::binding::{
    ActionRequestWithBinding, AuthenticatedRequestWithBinding, HasBinding, RequestWithBinding,
};

/// GET /binding?binding=<id> - resolved binding, no mandates required
pub async fn show_binding(req: RequestWithBinding) -> impl IntoResponse {
    Json(json!({
        "request_id": req.id(),
        "binding": BindingView::of(req.binding()),
    }))
}

/// GET /binding/admin?binding=<id> - binding plus the mandates that were presented
pub async fn admin_binding(req: AuthenticatedRequestWithBinding) -> impl IntoResponse {
    let mandates: Vec<PresentedMandateView> =
        req.mandates().iter().map(PresentedMandateView::of).collect();

    Json(json!({
        "request_id": req.id(),
        "binding": BindingView::of(req.binding()),
        "mandates": mandates,
    }))
}

/// POST /binding/actions - accept an action scoped to a binding
pub async fn run_action(req: ActionRequestWithBinding) -> impl IntoResponse {
    let action = req.action();
    tracing::info!(
        binding_id = %req.binding().id(),
        action = %action.action_type,
        "action accepted"
    );

    (
        StatusCode::ACCEPTED,
        Json(json!({
            "request_id": req.id(),
            "binding_id": req.binding().id().as_str(),
            "action": action.action_type,
            "nonce": action.nonce,
        })),
    )
}
