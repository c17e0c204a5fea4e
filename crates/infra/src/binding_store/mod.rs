//! Binding lookup abstractions.
//!
//! The store owns bindings; request handling only ever receives shared,
//! read-only handles (`Arc<Binding>`).

use std::sync::Arc;

use thiserror::Error;

use bindgate_auth::Binding;
use bindgate_core::BindingId;

pub mod in_memory;

pub use in_memory::InMemoryBindingStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("binding '{0}' not found")]
    NotFound(BindingId),

    #[error("binding store failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Resolves binding identifiers to bindings.
///
/// Implementations must be safe to call concurrently and must not retain
/// per-request state. Lookups are idempotent.
pub trait BindingStore: Send + Sync {
    fn get(&self, id: &BindingId) -> Result<Arc<Binding>, StoreError>;
}

impl<S> BindingStore for Arc<S>
where
    S: BindingStore + ?Sized,
{
    fn get(&self, id: &BindingId) -> Result<Arc<Binding>, StoreError> {
        (**self).get(id)
    }
}
