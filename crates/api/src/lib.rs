//! HTTP API: binding attachment, request shapes, routing and error mapping.

pub mod app;
pub mod binding;
pub mod config;
pub mod context;
pub mod middleware;
pub mod request;

pub use binding::{
    attach_binding, resolve_binding, ActionRequestWithBinding, AuthenticatedRequestWithBinding,
    BindingRejection, BindingScope, HasBinding, RequestWithBinding, WithBinding,
};
pub use request::{Action, ActionRequest, AuthenticatedRequest, PlainRequest};
