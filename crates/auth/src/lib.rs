//! `bindgate-auth`: binding-scoped mandate authorization.
//!
//! This crate is intentionally decoupled from HTTP and storage: it models
//! bindings, realms and mandates, and decides whether presented mandates
//! authorize an action against a binding.

pub mod authorize;
pub mod binding;
pub mod decode;
pub mod mandate;
pub mod roles;

pub use authorize::{authorize, explain_mandates, DenialKind, MandateCheck, MandateExplanation, MandateOutcome};
pub use binding::{Binding, Realm};
pub use decode::{MandateDecodeError, MandateDecoder, UnverifiedMandateDecoder};
pub use mandate::{validate_window, Mandate, MandateWindowError, SignedMandate};
pub use roles::Role;
