//! Infrastructure layer: binding storage adapters.

pub mod binding_store;

pub use binding_store::{BindingStore, InMemoryBindingStore, StoreError};
