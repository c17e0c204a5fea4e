use serde::Serialize;

use bindgate_core::{Entity, Thumbprint};

use crate::{Binding, SignedMandate};

/// Decide whether any presented mandate authorizes administrative access to
/// `binding`.
///
/// A mandate counts iff its signer's thumbprint equals the thumbprint of the
/// binding realm's public key **and** its role is one of the binding's admin
/// roles (exact match). An empty mandate list never authorizes, and neither
/// does a realm key that cannot be fingerprinted.
///
/// - No IO
/// - No panics
/// - Order of `mandates` is irrelevant
pub fn authorize(mandates: &[SignedMandate], binding: &Binding) -> bool {
    let Ok(realm_tp) = binding.realm().public_key.thumbprint() else {
        return false;
    };

    mandates
        .iter()
        .any(|m| check_mandate(m, &realm_tp, binding).0 == MandateOutcome::Authorized)
}

fn check_mandate(
    mandate: &SignedMandate,
    realm_tp: &Thumbprint,
    binding: &Binding,
) -> (MandateOutcome, Option<Thumbprint>) {
    let signer_tp = match mandate.signer.thumbprint() {
        Ok(tp) => tp,
        Err(_) => return (MandateOutcome::SignerKeyInvalid, None),
    };

    let outcome = if signer_tp != *realm_tp {
        MandateOutcome::SignerMismatch
    } else if !binding.has_admin_role(mandate.role()) {
        MandateOutcome::RoleNotAdmin
    } else {
        MandateOutcome::Authorized
    };

    (outcome, Some(signer_tp))
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Result of checking a single mandate against a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MandateOutcome {
    Authorized,
    /// Signed by a key other than the binding realm's key.
    SignerMismatch,
    /// Signed by the realm, but the role is not an admin role of the binding.
    RoleNotAdmin,
    /// The signer key could not be fingerprinted.
    SignerKeyInvalid,
}

/// Per-mandate line of a [`MandateExplanation`].
#[derive(Debug, Clone, Serialize)]
pub struct MandateCheck {
    pub index: usize,
    pub role: String,
    pub signer_thumbprint: Option<Thumbprint>,
    pub outcome: MandateOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    NoMandates,
    RealmKeyInvalid,
    SignerMismatch,
    RoleNotAdmin,
}

/// Detailed explanation of a mandate authorization decision.
///
/// `granted` always agrees with [`authorize`] for the same inputs.
#[derive(Debug, Clone, Serialize)]
pub struct MandateExplanation {
    pub binding_id: String,
    pub realm_thumbprint: Option<Thumbprint>,
    pub granted: bool,
    pub reason: String,
    pub denial: Option<DenialKind>,
    pub mandates: Vec<MandateCheck>,
}

/// Explain why presented mandates do or do not authorize `binding`.
///
/// Used for audit logging of denials; it answers "which mandate came closest
/// and what was missing".
pub fn explain_mandates(mandates: &[SignedMandate], binding: &Binding) -> MandateExplanation {
    let binding_id = binding.id().to_string();

    let realm_tp = match binding.realm().public_key.thumbprint() {
        Ok(tp) => tp,
        Err(e) => {
            return MandateExplanation {
                binding_id,
                realm_thumbprint: None,
                granted: false,
                reason: format!("Realm '{}' key cannot be fingerprinted: {e}", binding.realm().id),
                denial: Some(DenialKind::RealmKeyInvalid),
                mandates: Vec::new(),
            };
        }
    };

    let checks: Vec<MandateCheck> = mandates
        .iter()
        .enumerate()
        .map(|(index, m)| {
            let (outcome, signer_thumbprint) = check_mandate(m, &realm_tp, binding);
            MandateCheck {
                index,
                role: m.role().as_str().to_string(),
                signer_thumbprint,
                outcome,
            }
        })
        .collect();

    let (granted, denial, reason) = if checks.is_empty() {
        (false, Some(DenialKind::NoMandates), "No mandates presented".to_string())
    } else if let Some(hit) = checks.iter().find(|c| c.outcome == MandateOutcome::Authorized) {
        (
            true,
            None,
            format!("Mandate #{} grants admin role '{}'", hit.index, hit.role),
        )
    } else if let Some(near) = checks.iter().find(|c| c.outcome == MandateOutcome::RoleNotAdmin) {
        (
            false,
            Some(DenialKind::RoleNotAdmin),
            format!(
                "Mandate #{} is signed by the realm but role '{}' is not one of {:?}",
                near.index,
                near.role,
                binding.admin_roles().iter().map(|r| r.as_str()).collect::<Vec<_>>()
            ),
        )
    } else {
        (
            false,
            Some(DenialKind::SignerMismatch),
            format!("No mandate is signed by realm '{}'", binding.realm().id),
        )
    };

    MandateExplanation {
        binding_id,
        realm_thumbprint: Some(realm_tp),
        granted,
        reason,
        denial,
        mandates: checks,
    }
}
