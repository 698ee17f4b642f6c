//! Access control module
//!
//! Role-based route protection and permission-aware menus.
//!
//! ## Decision Model
//!
//! Routes are checked against three tiers, in order. The first tier with a
//! matching pattern decides:
//!
//! 1. **Public** - allowed for everyone, signed in or not
//! 2. **Authenticated** - allowed for any signed-in caller
//! 3. **Protected** - the first matching rule decides:
//!    - `admin_only` rules admit only the `admin` role
//!    - `permissions` rules admit callers holding any one listed permission
//!    - rules with neither admit any signed-in caller
//!
//! Routes matched by no tier are allowed. Deployments that prefer to deny
//! unlisted routes can select the menu strategy, which admits a route only
//! when it appears in a configured menu.
//!
//! ## Example Configuration
//!
//! ```toml
//! [policy]
//! public = ["/", "/sign-in", "/api/public/**"]
//! authenticated = ["/u", "/u/**"]
//!
//! [[policy.protected]]
//! pattern = "/a/users/**"          # Narrow rules first
//! permissions = ["manage_user"]
//!
//! [[policy.protected]]
//! pattern = "/a/**"
//! admin_only = true
//! ```

pub mod context;
pub mod guard;
pub mod menu;
pub mod patterns;
pub mod policy;
pub mod resolver;
pub mod roles;
pub mod types;

pub use context::{AuthorizationContext, IdentityClaims, Principal};
pub use guard::{GuardOutcome, RouteGuard};
pub use menu::{MenuItem, Menus, filter_menu, find_route};
pub use patterns::{PatternMatcher, RoutePattern};
pub use policy::{PolicyTable, RouteRule, RuleRequirement, ShadowedRule};
pub use resolver::{AccessDecision, AccessResolver, DenyReason};
pub use roles::RoleConfig;
pub use types::{Grant, Permission, PermissionSet, Role};
