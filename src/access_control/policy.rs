//! Route policy table
//!
//! Three ordered tiers compiled once from configuration:
//!
//! 1. **public** - open to everyone
//! 2. **authenticated** - open to any signed-in user
//! 3. **protected** - admin-only or permission-gated, first match wins
//!
//! The table exposes read-only iteration only. Rule order within the
//! protected tier is taken as written; [`PolicyTable::shadowed_rules`] reports
//! rules that an earlier rule makes unreachable.

use crate::access_control::patterns::{PatternMatcher, RoutePattern};
use crate::access_control::types::{Permission, join_names};
use crate::config::{PolicyConfig, RouteRuleConfig};
use crate::error::ConfigError;
use std::fmt;

/// What a protected rule demands of the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleRequirement {
    /// Only the admin role
    AdminOnly,
    /// Any one of the listed permissions
    AnyPermission(Vec<Permission>),
    /// Any signed-in user
    Authenticated,
}

impl fmt::Display for RuleRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleRequirement::AdminOnly => f.write_str("admin only"),
            RuleRequirement::AnyPermission(perms) => {
                write!(f, "any of [{}]", join_names(perms.iter().map(|p| p.as_str())))
            }
            RuleRequirement::Authenticated => f.write_str("authenticated"),
        }
    }
}

/// A compiled protected route rule
#[derive(Debug, Clone)]
pub struct RouteRule {
    pattern: RoutePattern,
    requirement: RuleRequirement,
}

impl RouteRule {
    pub fn new(config: &RouteRuleConfig) -> Result<Self, ConfigError> {
        let pattern = RoutePattern::new(&config.pattern)?;

        let requirement = match (config.admin_only, config.permissions.is_empty()) {
            (true, false) => {
                return Err(ConfigError::invalid(format!(
                    "route rule '{}' sets both admin_only and permissions",
                    config.pattern
                )));
            }
            (true, true) => RuleRequirement::AdminOnly,
            (false, false) => {
                let mut perms = Vec::with_capacity(config.permissions.len());
                for p in &config.permissions {
                    if !perms.contains(p) {
                        perms.push(*p);
                    }
                }
                RuleRequirement::AnyPermission(perms)
            }
            (false, true) => RuleRequirement::Authenticated,
        };

        Ok(Self {
            pattern,
            requirement,
        })
    }

    pub fn admin_only(pattern: &str) -> Result<Self, ConfigError> {
        Self::new(&RouteRuleConfig::admin_only(pattern))
    }

    pub fn with_permissions(pattern: &str, permissions: &[Permission]) -> Result<Self, ConfigError> {
        Self::new(&RouteRuleConfig::permissions(pattern, permissions))
    }

    pub fn matches(&self, path: &str) -> bool {
        self.pattern.matches(path)
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    pub fn requirement(&self) -> &RuleRequirement {
        &self.requirement
    }
}

/// A protected rule that can never match because an earlier rule covers it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowedRule {
    /// Index of the unreachable rule in the protected tier
    pub index: usize,
    pub pattern: String,
    /// Index of the earlier rule that wins instead
    pub shadowed_by: usize,
    pub shadowed_by_pattern: String,
}

impl fmt::Display for ShadowedRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rule #{} '{}' is unreachable: rule #{} '{}' matches first",
            self.index, self.pattern, self.shadowed_by, self.shadowed_by_pattern
        )
    }
}

/// Immutable three-tier route policy
#[derive(Debug, Clone, Default)]
pub struct PolicyTable {
    public: PatternMatcher,
    authenticated: PatternMatcher,
    protected: Vec<RouteRule>,
}

impl PolicyTable {
    /// Compile the policy from configuration
    pub fn new(config: &PolicyConfig) -> Result<Self, ConfigError> {
        let protected = config
            .protected
            .iter()
            .map(RouteRule::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            public: PatternMatcher::new(&config.public)?,
            authenticated: PatternMatcher::new(&config.authenticated)?,
            protected,
        })
    }

    /// First public pattern matching the path
    pub fn find_public(&self, path: &str) -> Option<&str> {
        self.public.find_match(path)
    }

    /// First authenticated-only pattern matching the path
    pub fn find_authenticated(&self, path: &str) -> Option<&str> {
        self.authenticated.find_match(path)
    }

    /// First protected rule matching the path, in declared order
    pub fn find_protected(&self, path: &str) -> Option<&RouteRule> {
        self.protected.iter().find(|rule| rule.matches(path))
    }

    pub fn public_patterns(&self) -> impl Iterator<Item = &RoutePattern> {
        self.public.iter()
    }

    pub fn authenticated_patterns(&self) -> impl Iterator<Item = &RoutePattern> {
        self.authenticated.iter()
    }

    pub fn protected_rules(&self) -> impl Iterator<Item = &RouteRule> {
        self.protected.iter()
    }

    /// Protected rules that an earlier rule makes unreachable
    pub fn shadowed_rules(&self) -> Vec<ShadowedRule> {
        let mut shadowed = Vec::new();

        for (index, rule) in self.protected.iter().enumerate() {
            let winner = self.protected[..index]
                .iter()
                .position(|earlier| earlier.pattern.covers(&rule.pattern));

            if let Some(shadowed_by) = winner {
                shadowed.push(ShadowedRule {
                    index,
                    pattern: rule.pattern.as_str().to_string(),
                    shadowed_by,
                    shadowed_by_pattern: self.protected[shadowed_by].pattern.as_str().to_string(),
                });
            }
        }

        shadowed
    }
}
