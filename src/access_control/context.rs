//! Per-request authorization context
//!
//! An [`AuthorizationContext`] is built once per request by the caller and
//! never changes afterwards. Identity lookup failures are folded into
//! [`AuthorizationContext::Unauthenticated`] before the engine sees them.

use crate::access_control::types::{Grant, Permission, PermissionSet, Role};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use tracing::warn;

/// Authenticated caller identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: String,
    pub role: Role,
    pub permissions: PermissionSet,
}

/// Resolved caller identity for one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthorizationContext {
    #[default]
    Unauthenticated,
    Authenticated(Principal),
}

/// Raw identity as reported by an external session or identity provider
///
/// `role` is the unvalidated role claim and `permissions` holds per-user
/// overrides; both are resolved against a role configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IdentityClaims {
    pub user_id: String,
    pub role: Option<String>,
    pub permissions: Vec<String>,
}

impl AuthorizationContext {
    pub fn unauthenticated() -> Self {
        AuthorizationContext::Unauthenticated
    }

    pub fn authenticated(
        user_id: impl Into<String>,
        role: Role,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        AuthorizationContext::Authenticated(Principal {
            user_id: user_id.into(),
            role,
            permissions: permissions.into_iter().collect(),
        })
    }

    /// Normalize the outcome of an identity lookup.
    ///
    /// Lookup errors and absent identities both become `Unauthenticated`; the
    /// resolver closure turns claims into a context (usually
    /// [`RoleConfig::resolve`](crate::access_control::RoleConfig::resolve)).
    pub fn from_lookup<E, F>(lookup: Result<Option<IdentityClaims>, E>, resolve: F) -> Self
    where
        E: Display,
        F: FnOnce(&IdentityClaims) -> AuthorizationContext,
    {
        match lookup {
            Ok(Some(claims)) => resolve(&claims),
            Ok(None) => AuthorizationContext::Unauthenticated,
            Err(e) => {
                warn!(error = %e, "Identity lookup failed, treating caller as unauthenticated");
                AuthorizationContext::Unauthenticated
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthorizationContext::Authenticated(_))
    }

    pub fn principal(&self) -> Option<&Principal> {
        match self {
            AuthorizationContext::Authenticated(principal) => Some(principal),
            AuthorizationContext::Unauthenticated => None,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.principal().map(|p| p.role)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.principal().map(|p| p.user_id.as_str())
    }

    /// Permissions held by the caller (empty when unauthenticated)
    pub fn permissions(&self) -> PermissionSet {
        self.principal()
            .map(|p| p.permissions.clone())
            .unwrap_or_default()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role() == Some(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.principal()
            .is_some_and(|p| p.permissions.contains(permission))
    }

    pub fn has_any_permission(&self, required: &[Permission]) -> bool {
        self.principal()
            .is_some_and(|p| p.permissions.intersects(required))
    }

    pub fn can_write_content(&self) -> bool {
        self.has_permission(Permission::WriteContent)
    }

    pub fn can_edit_content(&self) -> bool {
        self.has_permission(Permission::EditContent)
    }

    pub fn can_manage_user(&self) -> bool {
        self.has_permission(Permission::ManageUser)
    }

    /// True if the caller satisfies at least one menu requirement.
    ///
    /// Role grants match the caller's role exactly; permission grants match
    /// held permissions. Unauthenticated callers satisfy nothing.
    pub fn satisfies_any(&self, grants: &[Grant]) -> bool {
        let Some(principal) = self.principal() else {
            return false;
        };

        grants.iter().any(|grant| match grant {
            Grant::Role(role) => principal.role == *role,
            Grant::Permission(permission) => principal.permissions.contains(*permission),
        })
    }
}
