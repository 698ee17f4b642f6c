//! Role configuration
//!
//! Maps every [`Role`] to its default permissions and turns raw identity
//! claims into an [`AuthorizationContext`].

use crate::access_control::context::{AuthorizationContext, IdentityClaims};
use crate::access_control::types::{Permission, PermissionSet, Role};
use crate::config::RolesConfig;
use crate::error::ConfigError;
use std::collections::HashMap;
use tracing::{trace, warn};

/// Total mapping from role to default permissions
#[derive(Debug, Clone)]
pub struct RoleConfig {
    default_role: Role,
    grants: HashMap<Role, PermissionSet>,
}

impl RoleConfig {
    /// Build the role mapping, failing if any role lacks an entry
    pub fn new(config: &RolesConfig) -> Result<Self, ConfigError> {
        if let Some(unknown) = config.grants.keys().find(|k| Role::try_parse(k).is_none()) {
            return Err(ConfigError::invalid(format!("Unknown role: {}", unknown)));
        }

        let mut grants = HashMap::with_capacity(Role::all().len());
        for role in Role::all() {
            let Some(permissions) = config.grants.get(role.as_str()) else {
                return Err(ConfigError::Missing {
                    field: format!("roles.grants.{}", role),
                });
            };
            grants.insert(*role, permissions.iter().copied().collect());
        }

        Ok(Self {
            default_role: config.default_role,
            grants,
        })
    }

    /// Role assigned to users whose role claim is missing or unknown
    pub fn default_role(&self) -> Role {
        self.default_role
    }

    /// Default permissions granted to a role
    pub fn permissions_for(&self, role: Role) -> PermissionSet {
        self.grants.get(&role).cloned().unwrap_or_default()
    }

    /// Build an authenticated context from a role plus per-user overrides
    pub fn context_for(
        &self,
        user_id: impl Into<String>,
        role: Role,
        overrides: impl IntoIterator<Item = Permission>,
    ) -> AuthorizationContext {
        let permissions = self
            .permissions_for(role)
            .union(overrides.into_iter().collect());

        AuthorizationContext::authenticated(user_id, role, permissions.iter())
    }

    /// Resolve raw identity claims into an authenticated context.
    ///
    /// Unknown role claims fall back to the default role; unknown override
    /// permissions are dropped.
    pub fn resolve(&self, claims: &IdentityClaims) -> AuthorizationContext {
        let role = Role::parse_or(claims.role.as_deref(), self.default_role);
        if let Some(raw) = claims.role.as_deref()
            && Role::try_parse(raw).is_none()
        {
            warn!(
                user_id = %claims.user_id,
                claim = raw,
                fallback = %role,
                "Unknown role claim, using default role"
            );
        }

        let overrides = claims.permissions.iter().filter_map(|raw| {
            let parsed = Permission::try_parse(raw);
            if parsed.is_none() {
                warn!(
                    user_id = %claims.user_id,
                    permission = raw.as_str(),
                    "Ignoring unknown permission override"
                );
            }
            parsed
        });

        let context = self.context_for(claims.user_id.clone(), role, overrides);
        trace!(user_id = %claims.user_id, role = %role, "Resolved identity claims");
        context
    }
}
