//! Permission-aware navigation menus
//!
//! Menus are static trees owned by configuration. Filtering never touches the
//! source tree; each call returns a pruned copy for one caller.

use crate::access_control::context::AuthorizationContext;
use crate::access_control::types::{Grant, join_names};
use crate::config::MenusConfig;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A navigation entry, possibly with nested entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(alias = "title")]
    pub label: String,

    pub href: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// Any one of these grants makes the item visible; empty means no requirement
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<Grant>,

    /// Nested entries; `null` and absent both mean a leaf
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub children: Vec<MenuItem>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<MenuItem>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<MenuItem>>::deserialize(deserializer)?.unwrap_or_default())
}

impl MenuItem {
    pub fn new(label: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            href: href.into(),
            description: None,
            icon: None,
            permissions: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_permissions(mut self, grants: impl IntoIterator<Item = Grant>) -> Self {
        self.permissions = grants.into_iter().collect();
        self
    }

    pub fn with_children(mut self, children: Vec<MenuItem>) -> Self {
        self.children = children;
        self
    }

    /// Whether this item itself is visible to the caller
    pub fn is_visible_to(&self, context: &AuthorizationContext) -> bool {
        self.permissions.is_empty() || context.satisfies_any(&self.permissions)
    }

    /// Human-readable list of the item's requirements, joined with "or"
    pub fn requirement_list(&self) -> String {
        self.permissions
            .iter()
            .map(|g| g.as_str())
            .collect::<Vec<_>>()
            .join(" or ")
    }

    /// Copy of this item carrying the given children instead of its own
    fn with_filtered_children(&self, children: Vec<MenuItem>) -> MenuItem {
        MenuItem {
            label: self.label.clone(),
            href: self.href.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
            permissions: self.permissions.clone(),
            children,
        }
    }
}

/// Prune a menu tree down to what the caller may reach.
///
/// A visible item keeps its (filtered) children. An invisible item is kept
/// only as a folder for visible descendants. Sibling order is preserved.
pub fn filter_menu(items: &[MenuItem], context: &AuthorizationContext) -> Vec<MenuItem> {
    items
        .iter()
        .filter_map(|item| {
            let children = filter_menu(&item.children, context);

            if item.is_visible_to(context) || !children.is_empty() {
                Some(item.with_filtered_children(children))
            } else {
                None
            }
        })
        .collect()
}

/// Depth-first search for the first item whose `href` equals `route`
pub fn find_route<'a>(items: &'a [MenuItem], route: &str) -> Option<&'a MenuItem> {
    for item in items {
        if item.href == route {
            return Some(item);
        }
        if let Some(found) = find_route(&item.children, route) {
            return Some(found);
        }
    }
    None
}

/// Named menu sections, immutable after construction
#[derive(Debug, Clone, Default)]
pub struct Menus {
    sections: BTreeMap<String, Vec<MenuItem>>,
}

impl Menus {
    pub fn new(config: &MenusConfig) -> Self {
        Self {
            sections: config.0.clone(),
        }
    }

    pub fn section(&self, name: &str) -> Option<&[MenuItem]> {
        self.sections.get(name).map(Vec::as_slice)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    /// Filter every section for the caller
    pub fn accessible(&self, context: &AuthorizationContext) -> BTreeMap<String, Vec<MenuItem>> {
        self.sections
            .iter()
            .map(|(name, items)| (name.clone(), filter_menu(items, context)))
            .collect()
    }

    /// Find a route in any section.
    ///
    /// Sections are searched in alphabetical order of their names, not in the
    /// order they appear in the configuration file. When the same `href` is
    /// listed in several sections, the entry from the first section by name
    /// decides access.
    pub fn find_route(&self, route: &str) -> Option<&MenuItem> {
        self.sections
            .values()
            .find_map(|items| find_route(items, route))
    }

    /// Every `href` in every section, depth-first
    pub fn hrefs(&self) -> Vec<&str> {
        fn collect<'a>(items: &'a [MenuItem], out: &mut Vec<&'a str>) {
            for item in items {
                out.push(item.href.as_str());
                collect(&item.children, out);
            }
        }

        let mut out = Vec::new();
        for items in self.sections.values() {
            collect(items, &mut out);
        }
        out
    }
}

/// Render the grants a caller holds, for denial messages
pub(crate) fn describe_holdings(context: &AuthorizationContext) -> String {
    match context.principal() {
        Some(principal) if principal.permissions.is_empty() => {
            format!("role {} with no permissions", principal.role)
        }
        Some(principal) => format!(
            "role {} with {}",
            principal.role,
            join_names(principal.permissions.iter().map(|p| p.as_str()))
        ),
        None => "nothing (not signed in)".to_string(),
    }
}
