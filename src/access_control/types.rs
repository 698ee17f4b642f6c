//! Access control types
//!
//! Core types used by the access control system.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// User role
///
/// Roles are independent tags rather than a hierarchy. The only special case
/// is `Admin`, which is the sole role admitted by admin-only rules.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Editor,
    #[default]
    Viewer,
}

impl Role {
    /// Get the role name as a string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }

    /// Try to parse a role from a string
    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "editor" => Some(Role::Editor),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }

    /// Parse a raw role claim, falling back to `default` when the claim is
    /// missing or names a role this system does not know.
    pub fn parse_or(claim: Option<&str>, default: Role) -> Self {
        claim.and_then(Self::try_parse).unwrap_or(default)
    }

    /// Get all roles
    pub fn all() -> &'static [Role] {
        &[Role::Admin, Role::Editor, Role::Viewer]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fine-grained capability checked against route and menu requirements
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    WriteContent,
    EditContent,
    ManageUser,
}

impl Permission {
    /// Get the permission name as a string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Permission::WriteContent => "write_content",
            Permission::EditContent => "edit_content",
            Permission::ManageUser => "manage_user",
        }
    }

    /// Try to parse a permission from a string
    pub fn try_parse(s: &str) -> Option<Self> {
        match s {
            "write_content" => Some(Permission::WriteContent),
            "edit_content" => Some(Permission::EditContent),
            "manage_user" => Some(Permission::ManageUser),
            _ => None,
        }
    }

    /// Get all permissions
    pub fn all() -> &'static [Permission] {
        &[
            Permission::WriteContent,
            Permission::EditContent,
            Permission::ManageUser,
        ]
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Set of permissions held by a user
///
/// Ordered so that rendered lists (denial reasons, CLI output) are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    /// True if at least one of `required` is held (OR semantics)
    pub fn intersects(&self, required: &[Permission]) -> bool {
        required.iter().any(|p| self.0.contains(p))
    }

    pub fn insert(&mut self, permission: Permission) -> bool {
        self.0.insert(permission)
    }

    /// Union with another set, consuming both
    pub fn union(mut self, other: PermissionSet) -> Self {
        self.0.extend(other.0);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("none");
        }
        f.write_str(&join_names(self.iter().map(|p| p.as_str())))
    }
}

/// Requirement attached to a menu item
///
/// Menu sections may gate an entry on a permission or directly on a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Grant {
    Permission(Permission),
    Role(Role),
}

impl Grant {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Grant::Permission(p) => p.as_str(),
            Grant::Role(r) => r.as_str(),
        }
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Comma-join a list of names
pub(crate) fn join_names<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names.into_iter().collect::<Vec<_>>().join(", ")
}
