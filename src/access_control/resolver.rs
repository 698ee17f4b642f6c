//! Route access resolver
//!
//! Decides whether a caller may reach a path. Tiers are consulted in strict
//! order and the first tier that matches decides:
//!
//! 1. Public routes - always allowed
//! 2. Authenticated-only routes - allowed for any signed-in caller
//! 3. Protected routes - decided by the configured [`PolicyStrategy`]
//!
//! With [`PolicyStrategy::RouteTable`] the first matching protected rule
//! decides and unmatched routes are allowed. With [`PolicyStrategy::Menu`]
//! the route must be listed in a menu and unlisted routes are denied. A
//! resolver uses exactly one strategy.

use crate::access_control::context::AuthorizationContext;
use crate::access_control::menu::{Menus, describe_holdings};
use crate::access_control::policy::{PolicyTable, RuleRequirement};
use crate::access_control::types::{Permission, PermissionSet, Role, join_names};
use crate::config::{AppConfig, PolicyStrategy};
use crate::error::{AccessDeniedError, ConfigError};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

/// Why a request was denied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// The route needs a signed-in caller
    AuthenticationRequired,
    /// The route is admin-only
    AdminRequired,
    /// None of the rule's permissions are held
    MissingPermissions {
        required: Vec<Permission>,
        held: PermissionSet,
    },
    /// None of a menu entry's grants are satisfied
    MenuRequirements { required: String, holdings: String },
    /// Menu strategy only: the route is not listed in any menu
    NotInMenu { route: String },
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::AuthenticationRequired => f.write_str("Authentication required"),
            DenyReason::AdminRequired => f.write_str("Admin access required"),
            DenyReason::MissingPermissions { required, held } => write!(
                f,
                "Required permissions: {}. User has: {}",
                join_names(required.iter().map(|p| p.as_str())),
                held
            ),
            DenyReason::MenuRequirements { required, holdings } => write!(
                f,
                "Insufficient permissions. Required: {}. User has: {}",
                required, holdings
            ),
            DenyReason::NotInMenu { route } => {
                write!(f, "Route '{}' not found in any menu configuration", route)
            }
        }
    }
}

/// Result of access check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Access is allowed
    Allowed,
    /// Access is denied with a reason
    Denied(DenyReason),
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessDecision::Allowed)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, AccessDecision::Denied(_))
    }

    /// Human-readable denial reason, `None` when allowed
    pub fn reason(&self) -> Option<String> {
        match self {
            AccessDecision::Allowed => None,
            AccessDecision::Denied(reason) => Some(reason.to_string()),
        }
    }

    pub fn deny_reason(&self) -> Option<&DenyReason> {
        match self {
            AccessDecision::Allowed => None,
            AccessDecision::Denied(reason) => Some(reason),
        }
    }
}

/// Strategy for the protected tier
#[derive(Debug, Clone)]
enum ProtectedTier {
    RouteTable,
    Menu(Arc<Menus>),
}

/// Route access resolver
///
/// Holds the immutable policy; cheap to clone and safe to share across
/// threads.
#[derive(Debug, Clone)]
pub struct AccessResolver {
    policy: Arc<PolicyTable>,
    protected: ProtectedTier,
}

impl AccessResolver {
    /// Create a resolver that decides protected routes from the rule table
    pub fn new(policy: PolicyTable) -> Self {
        Self::with_shared(Arc::new(policy))
    }

    /// Create a route-table resolver over a shared policy
    pub fn with_shared(policy: Arc<PolicyTable>) -> Self {
        Self {
            policy,
            protected: ProtectedTier::RouteTable,
        }
    }

    /// Create a resolver that decides protected routes from menu entries.
    ///
    /// Routes missing from every menu are denied.
    pub fn menu_driven(policy: Arc<PolicyTable>, menus: Arc<Menus>) -> Self {
        Self {
            policy,
            protected: ProtectedTier::Menu(menus),
        }
    }

    /// Build the resolver selected by `policy.strategy`
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let policy = Arc::new(PolicyTable::new(&config.policy)?);

        Ok(match config.policy.strategy {
            PolicyStrategy::RouteTable => Self::with_shared(policy),
            PolicyStrategy::Menu => {
                Self::menu_driven(policy, Arc::new(Menus::new(&config.menus)))
            }
        })
    }

    pub fn policy(&self) -> &PolicyTable {
        &self.policy
    }

    pub fn strategy(&self) -> PolicyStrategy {
        match self.protected {
            ProtectedTier::RouteTable => PolicyStrategy::RouteTable,
            ProtectedTier::Menu(_) => PolicyStrategy::Menu,
        }
    }

    /// Decide whether the caller may access `path`
    #[instrument(
        level = "debug",
        skip(self, context),
        fields(authenticated = context.is_authenticated(), role = ?context.role())
    )]
    pub fn decide(&self, path: &str, context: &AuthorizationContext) -> AccessDecision {
        let decision = self.evaluate(path, context);

        match &decision {
            AccessDecision::Allowed => debug!("Access allowed"),
            AccessDecision::Denied(reason) => debug!(reason = %reason, "Access denied"),
        }

        decision
    }

    fn evaluate(&self, path: &str, context: &AuthorizationContext) -> AccessDecision {
        // 1. Public routes
        if let Some(pattern) = self.policy.find_public(path) {
            trace!(pattern, "Matched public route");
            return AccessDecision::Allowed;
        }

        // 2. Authenticated-only routes
        if let Some(pattern) = self.policy.find_authenticated(path) {
            trace!(pattern, "Matched authenticated route");
            return if context.is_authenticated() {
                AccessDecision::Allowed
            } else {
                AccessDecision::Denied(DenyReason::AuthenticationRequired)
            };
        }

        // 3. Protected routes
        match &self.protected {
            ProtectedTier::RouteTable => self.check_route_table(path, context),
            ProtectedTier::Menu(menus) => check_menu(menus, path, context),
        }
    }

    fn check_route_table(&self, path: &str, context: &AuthorizationContext) -> AccessDecision {
        let Some(rule) = self.policy.find_protected(path) else {
            trace!("No protected rule matched, allowing");
            return AccessDecision::Allowed;
        };
        trace!(pattern = rule.pattern().as_str(), requirement = %rule.requirement(), "Matched protected rule");

        let Some(principal) = context.principal() else {
            return AccessDecision::Denied(DenyReason::AuthenticationRequired);
        };

        match rule.requirement() {
            RuleRequirement::AdminOnly if principal.role == Role::Admin => AccessDecision::Allowed,
            RuleRequirement::AdminOnly => AccessDecision::Denied(DenyReason::AdminRequired),
            RuleRequirement::AnyPermission(required) => {
                if principal.permissions.intersects(required) {
                    AccessDecision::Allowed
                } else {
                    AccessDecision::Denied(DenyReason::MissingPermissions {
                        required: required.clone(),
                        held: principal.permissions.clone(),
                    })
                }
            }
            RuleRequirement::Authenticated => AccessDecision::Allowed,
        }
    }

    /// Check access, returning an error if denied
    pub fn require(&self, path: &str, context: &AuthorizationContext) -> Result<(), AccessDeniedError> {
        match self.decide(path, context) {
            AccessDecision::Allowed => Ok(()),
            AccessDecision::Denied(reason) => Err(AccessDeniedError::new(path, reason.to_string())),
        }
    }
}

fn check_menu(menus: &Menus, path: &str, context: &AuthorizationContext) -> AccessDecision {
    if is_error_page(path) {
        trace!("System error page, allowing");
        return AccessDecision::Allowed;
    }

    let Some(item) = menus.find_route(path) else {
        return AccessDecision::Denied(DenyReason::NotInMenu {
            route: path.to_string(),
        });
    };
    trace!(label = item.label.as_str(), "Matched menu entry");

    if item.permissions.is_empty() || context.satisfies_any(&item.permissions) {
        AccessDecision::Allowed
    } else {
        AccessDecision::Denied(DenyReason::MenuRequirements {
            required: item.requirement_list(),
            holdings: describe_holdings(context),
        })
    }
}

/// `/4xx` and `/5xx` pages
fn is_error_page(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() == 4
        && bytes[0] == b'/'
        && matches!(bytes[1], b'4' | b'5')
        && bytes[2].is_ascii_digit()
        && bytes[3].is_ascii_digit()
}
