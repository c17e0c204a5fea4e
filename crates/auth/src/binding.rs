//! Bindings and the realms they trust.

use serde::{Deserialize, Serialize};

use bindgate_core::{BindingId, Entity, PublicKey, RealmId};

use crate::Role;

/// A trust domain identified by its public key.
///
/// Mandates signed by this key are trusted for every binding under the realm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Realm {
    pub id: RealmId,
    pub public_key: PublicKey,
}

impl Realm {
    pub fn new(id: RealmId, public_key: PublicKey) -> Self {
        Self { id, public_key }
    }
}

/// Per-tenant configuration: which realm is trusted and which roles count as
/// administrative.
///
/// Bindings are owned by a binding store and are read-only for request
/// handling; there are deliberately no mutators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    id: BindingId,
    realm: Realm,
    #[serde(default)]
    admin_roles: Vec<Role>,
}

impl Binding {
    pub fn new(id: BindingId, realm: Realm, admin_roles: Vec<Role>) -> Self {
        Self {
            id,
            realm,
            admin_roles,
        }
    }

    pub fn realm(&self) -> &Realm {
        &self.realm
    }

    pub fn admin_roles(&self) -> &[Role] {
        &self.admin_roles
    }

    /// Exact membership test against the admin role list.
    pub fn has_admin_role(&self, role: &Role) -> bool {
        self.admin_roles.iter().any(|r| r == role)
    }
}

impl Entity for Binding {
    type Id = BindingId;

    fn id(&self) -> &BindingId {
        &self.id
    }
}
