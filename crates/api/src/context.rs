use bindgate_auth::SignedMandate;
use uuid::Uuid;

/// Per-request context inserted by the request-context middleware.
///
/// Immutable once created; one per inbound request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RequestContext {
    request_id: Uuid,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::now_v7(),
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Mandates presented by the caller, decoded by the mandate middleware.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentedMandates(Vec<SignedMandate>);

impl PresentedMandates {
    pub fn new(mandates: Vec<SignedMandate>) -> Self {
        Self(mandates)
    }

    pub fn as_slice(&self) -> &[SignedMandate] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<SignedMandate> {
        self.0
    }
}
