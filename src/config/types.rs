//! Configuration types for route-rbac
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables. Every section has a default, so
//! an empty configuration yields the built-in policy.

use crate::access_control::menu::MenuItem;
use crate::access_control::types::{Grant, Permission, Role};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Role to permission mapping
    pub roles: RolesConfig,

    /// Route policy tiers
    pub policy: PolicyConfig,

    /// Named navigation menus
    pub menus: MenusConfig,

    /// Redirect targets handed to the request layer on denial
    pub guard: GuardConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Role configuration
///
/// Every role must have an entry in `grants`, even when it grants nothing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RolesConfig {
    /// Role assigned when a user's role claim is missing or unknown
    pub default_role: Role,

    /// Default permissions per role name
    pub grants: BTreeMap<String, Vec<Permission>>,
}

impl Default for RolesConfig {
    fn default() -> Self {
        let grants = BTreeMap::from([
            (
                Role::Admin.to_string(),
                vec![
                    Permission::WriteContent,
                    Permission::EditContent,
                    Permission::ManageUser,
                ],
            ),
            (
                Role::Editor.to_string(),
                vec![Permission::WriteContent, Permission::EditContent],
            ),
            (Role::Viewer.to_string(), vec![]),
        ]);

        Self {
            default_role: Role::Viewer,
            grants,
        }
    }
}

/// How routes that fall through the public and authenticated tiers are decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStrategy {
    /// First matching protected rule decides; unmatched routes are allowed
    #[default]
    RouteTable,
    /// Legacy: the route must appear as a menu entry; unmatched routes are denied
    Menu,
}

/// Route policy configuration
///
/// `protected` is evaluated in order and the first matching rule wins, so
/// narrow patterns must come before broad ones.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Which strategy decides non-public, non-authenticated-only routes
    pub strategy: PolicyStrategy,

    /// Routes open to everyone
    pub public: Vec<String>,

    /// Routes open to any signed-in user
    pub authenticated: Vec<String>,

    /// Admin-only or permission-gated routes
    pub protected: Vec<RouteRuleConfig>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let public = [
            "/",
            "/sign-in",
            "/sign-up",
            "/404",
            "/403",
            "/500",
            "/about",
            "/contact",
            "/privacy",
            "/terms",
            "/api/public/**",
        ];
        let authenticated = ["/u", "/u/**", "/profile", "/settings/account"];

        use Permission::*;
        let protected = vec![
            RouteRuleConfig::admin_only("/a/users/roles/**"),
            RouteRuleConfig::permissions("/a/users/profile/edit", &[ManageUser]),
            RouteRuleConfig::permissions("/a/users/**", &[ManageUser]),
            RouteRuleConfig::admin_only("/a"),
            RouteRuleConfig::admin_only("/a/**"),
            RouteRuleConfig::admin_only("/test/admin"),
            RouteRuleConfig::permissions("/test/editor", &[WriteContent, EditContent]),
            RouteRuleConfig::permissions("/test/viewer", &[]),
            RouteRuleConfig::permissions("/content/create", &[WriteContent]),
            RouteRuleConfig::permissions("/content/edit/**", &[EditContent]),
            RouteRuleConfig::permissions("/content/publish/**", &[WriteContent, EditContent]),
            RouteRuleConfig::permissions("/content/delete/**", &[EditContent]),
            RouteRuleConfig::admin_only("/api/a/**"),
            RouteRuleConfig::permissions("/api/content/**", &[WriteContent, EditContent]),
            RouteRuleConfig::permissions("/api/users/**", &[ManageUser]),
            RouteRuleConfig::admin_only("/settings/system/**"),
            RouteRuleConfig::permissions("/settings/user/**", &[]),
        ];

        Self {
            strategy: PolicyStrategy::RouteTable,
            public: public.iter().map(|s| s.to_string()).collect(),
            authenticated: authenticated.iter().map(|s| s.to_string()).collect(),
            protected,
        }
    }
}

/// A single protected route rule as written in configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteRuleConfig {
    /// Route pattern (`*` one segment, `**` any depth)
    pub pattern: String,

    /// Only the admin role may access the route
    #[serde(default)]
    pub admin_only: bool,

    /// Any one of these permissions grants access; empty means any signed-in user
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl RouteRuleConfig {
    pub fn admin_only(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            admin_only: true,
            permissions: Vec::new(),
        }
    }

    pub fn permissions(pattern: impl Into<String>, permissions: &[Permission]) -> Self {
        Self {
            pattern: pattern.into(),
            admin_only: false,
            permissions: permissions.to_vec(),
        }
    }
}

/// Navigation menus keyed by section name
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct MenusConfig(pub BTreeMap<String, Vec<MenuItem>>);

impl Default for MenusConfig {
    fn default() -> Self {
        let page = |label: &str, href: &str, description: &str, grants: &[Grant]| MenuItem {
            label: label.to_string(),
            href: href.to_string(),
            description: Some(description.to_string()),
            icon: None,
            permissions: grants.to_vec(),
            children: Vec::new(),
        };

        let test_section = MenuItem {
            children: vec![
                page(
                    "Admin Test",
                    "/test/admin",
                    "Admin access test page",
                    &[Grant::Role(Role::Admin)],
                ),
                page(
                    "Editor Test",
                    "/test/editor",
                    "Editor access test page",
                    &[Grant::Role(Role::Editor)],
                ),
                page(
                    "Viewer Test",
                    "/test/viewer",
                    "Viewer access test page",
                    &[Grant::Role(Role::Viewer)],
                ),
                page(
                    "Components Test",
                    "/test/components",
                    "Component access test page",
                    &[
                        Grant::Role(Role::Admin),
                        Grant::Role(Role::Editor),
                        Grant::Role(Role::Viewer),
                    ],
                ),
            ],
            ..page("RBAC Test", "/test", "A list of RBAC Test Pages", &[])
        };

        Self(BTreeMap::from([
            ("footer".to_string(), Vec::new()),
            ("main".to_string(), Vec::new()),
            ("test".to_string(), vec![test_section]),
            ("user".to_string(), Vec::new()),
        ]))
    }
}

/// Redirect targets for denied requests
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Where unauthenticated callers are sent
    pub sign_in_path: String,

    /// Where authenticated but unauthorized callers are sent
    pub forbidden_path: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            sign_in_path: "/sign-in".to_string(),
            forbidden_path: "/403".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}
