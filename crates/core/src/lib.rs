//! `bindgate-core`: shared primitives for binding-scoped authorization.
//!
//! This crate contains **pure** building blocks (no HTTP, no storage).

pub mod entity;
pub mod error;
pub mod id;
pub mod key;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{BindingId, RealmId};
pub use key::{PublicKey, Thumbprint};
