use serde::Serialize;

use bindgate_auth::{Binding, SignedMandate};
use bindgate_core::Entity;

/// Public view of a resolved binding.
#[derive(Debug, Clone, Serialize)]
pub struct BindingView {
    pub binding_id: String,
    pub realm_id: String,
    /// `None` when the realm key cannot be fingerprinted.
    pub realm_thumbprint: Option<String>,
    pub admin_roles: Vec<String>,
}

impl BindingView {
    pub fn of(binding: &Binding) -> Self {
        Self {
            binding_id: binding.id().to_string(),
            realm_id: binding.realm().id.to_string(),
            realm_thumbprint: binding
                .realm()
                .public_key
                .thumbprint()
                .ok()
                .map(|tp| tp.to_string()),
            admin_roles: binding
                .admin_roles()
                .iter()
                .map(|r| r.as_str().to_string())
                .collect(),
        }
    }
}

/// Role asserted by a presented mandate, with the thumbprint of its signer.
#[derive(Debug, Clone, Serialize)]
pub struct PresentedMandateView {
    pub role: String,
    pub signer_thumbprint: Option<String>,
}

impl PresentedMandateView {
    pub fn of(mandate: &SignedMandate) -> Self {
        Self {
            role: mandate.role().as_str().to_string(),
            signer_thumbprint: mandate.signer.thumbprint().ok().map(|tp| tp.to_string()),
        }
    }
}
