//! Binding attachment: resolve the binding named by a request, check the
//! presented mandates against it, and hand the handler a request decorated
//! with the binding.
//!
//! The three request shapes share one pipeline ([`resolve_binding`]); a shape
//! only decides where the binding id comes from and whether mandates must be
//! verified ([`BindingScope`]). Every step is terminal on failure:
//!
//! | step      | failure                         | status |
//! |-----------|---------------------------------|--------|
//! | extract   | `No binding in request`         | 400    |
//! | resolve   | `could not lookup binding: ..`  | 500    |
//! | authorize | `Mandate not signed by binding realm` | 403 |

use std::future::Future;
use std::ops::Deref;
use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use bindgate_auth::{authorize, explain_mandates, Binding, SignedMandate};
use bindgate_core::BindingId;
use bindgate_infra::{BindingStore, StoreError};

use crate::app::errors::json_error;
use crate::request::{ActionRequest, AuthenticatedRequest, PlainRequest};

/// Name of the query (and action) parameter carrying the binding id.
pub const BINDING_PARAM: &str = "binding";

/// Capability of a request that has a resolved binding attached.
pub trait HasBinding {
    fn binding(&self) -> &Binding;
}

/// A request of shape `R` plus the binding resolved for it.
///
/// Built once per request by [`resolve_binding`]; derefs to `R`, so
/// everything available on the undecorated request stays available.
#[derive(Debug, Clone)]
pub struct WithBinding<R> {
    request: R,
    binding: Arc<Binding>,
}

impl<R> WithBinding<R> {
    fn new(request: R, binding: Arc<Binding>) -> Self {
        Self { request, binding }
    }

    pub fn request(&self) -> &R {
        &self.request
    }

    pub fn into_parts(self) -> (R, Arc<Binding>) {
        (self.request, self.binding)
    }
}

impl<R> Deref for WithBinding<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.request
    }
}

impl<R> HasBinding for WithBinding<R> {
    fn binding(&self) -> &Binding {
        &self.binding
    }
}

pub type RequestWithBinding = WithBinding<PlainRequest>;
pub type AuthenticatedRequestWithBinding = WithBinding<AuthenticatedRequest>;
pub type ActionRequestWithBinding = WithBinding<ActionRequest>;

/// How a request shape takes part in binding attachment.
pub trait BindingScope: Send + Sized {
    /// Whether presented mandates must authorize the resolved binding.
    const REQUIRES_MANDATE: bool;

    /// Raw binding identifier, if the request carries one.
    fn binding_id(&self) -> Option<&str>;

    fn mandates(&self) -> &[SignedMandate] {
        &[]
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl BindingScope for PlainRequest {
    const REQUIRES_MANDATE: bool = false;

    fn binding_id(&self) -> Option<&str> {
        non_empty(self.query_param(BINDING_PARAM))
    }
}

impl BindingScope for AuthenticatedRequest {
    const REQUIRES_MANDATE: bool = true;

    fn binding_id(&self) -> Option<&str> {
        non_empty(self.query_param(BINDING_PARAM))
    }

    fn mandates(&self) -> &[SignedMandate] {
        AuthenticatedRequest::mandates(self)
    }
}

impl BindingScope for ActionRequest {
    const REQUIRES_MANDATE: bool = true;

    /// Query parameter first, then the action's own parameters.
    fn binding_id(&self) -> Option<&str> {
        non_empty(self.query_param(BINDING_PARAM)).or_else(|| non_empty(self.action().param(BINDING_PARAM)))
    }

    fn mandates(&self) -> &[SignedMandate] {
        AuthenticatedRequest::mandates(self)
    }
}

/// Why a request could not be decorated with a binding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BindingRejection {
    #[error("No binding in request")]
    MissingIdentifier,

    /// Includes "not found": an unknown binding is reported as a lookup failure.
    #[error("could not lookup binding: {0}")]
    ResolutionFailure(#[source] StoreError),

    #[error("Mandate not signed by binding realm")]
    AuthorizationDenied,
}

impl BindingRejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingIdentifier => StatusCode::BAD_REQUEST,
            Self::ResolutionFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::AuthorizationDenied => StatusCode::FORBIDDEN,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingIdentifier => "missing_binding",
            Self::ResolutionFailure(_) => "binding_lookup_failed",
            Self::AuthorizationDenied => "mandate_not_authorized",
        }
    }
}

impl IntoResponse for BindingRejection {
    fn into_response(self) -> Response {
        json_error(self.status(), self.code(), self.to_string())
    }
}

/// Run extract → resolve → (authorize) and decorate the request.
pub fn resolve_binding<S, R>(store: &S, request: R) -> Result<WithBinding<R>, BindingRejection>
where
    S: BindingStore + ?Sized,
    R: BindingScope,
{
    let Some(id) = request.binding_id().and_then(|raw| BindingId::new(raw).ok()) else {
        tracing::warn!("no binding in request");
        return Err(BindingRejection::MissingIdentifier);
    };

    let binding = store.get(&id).map_err(|e| {
        tracing::error!(binding_id = %id, error = %e, "could not lookup binding");
        BindingRejection::ResolutionFailure(e)
    })?;

    if R::REQUIRES_MANDATE && !authorize(request.mandates(), &binding) {
        let explanation = explain_mandates(request.mandates(), &binding);
        tracing::warn!(
            binding_id = %id,
            realm_id = %binding.realm().id,
            denial = ?explanation.denial,
            presented = explanation.mandates.len(),
            "{}",
            explanation.reason
        );
        return Err(BindingRejection::AuthorizationDenied);
    }

    tracing::debug!(binding_id = %id, "binding attached");
    Ok(WithBinding::new(request, binding))
}

/// Attach a binding to `request` and invoke `handler` with the decorated
/// request, or answer with the rejection without calling `handler`.
pub async fn attach_binding<S, R, H, Fut>(store: &S, request: R, handler: H) -> Response
where
    S: BindingStore + ?Sized,
    R: BindingScope,
    H: FnOnce(WithBinding<R>) -> Fut,
    Fut: Future,
    Fut::Output: IntoResponse,
{
    match resolve_binding(store, request) {
        Ok(decorated) => handler(decorated).await.into_response(),
        Err(rejection) => rejection.into_response(),
    }
}

/// Lets handlers take `WithBinding<R>` directly as an argument.
///
/// The store is read from the `Extension<Arc<dyn BindingStore>>` installed by
/// the router.
#[async_trait]
impl<S, R> FromRequest<S> for WithBinding<R>
where
    S: Send + Sync,
    R: BindingScope + FromRequest<S, Rejection = Response>,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let store = req.extensions().get::<Arc<dyn BindingStore>>().cloned();
        let request = R::from_request(req, state).await?;

        let store = store.ok_or_else(|| {
            BindingRejection::ResolutionFailure(StoreError::backend("binding store not configured"))
                .into_response()
        })?;

        resolve_binding(store.as_ref(), request).map_err(IntoResponse::into_response)
    }
}
