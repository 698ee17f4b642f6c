//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Role grant variables (`PERMISSIONS_ADMIN`, `PERMISSIONS_EDITOR`, ...)
//! 2. Environment variables (ROUTE_RBAC__*)
//! 3. Configuration file (TOML)
//! 4. Default values
//!
//! The result is validated before it is returned, so a configuration that
//! loads successfully always compiles into a policy.

use crate::access_control::{
    AccessResolver, MenuItem, Menus, Permission, Role, RoleConfig, RouteGuard,
};
use crate::config::types::AppConfig;
use crate::error::{ConfigError, ConfigResult};
use config::{Config, Environment, File, FileFormat};
use std::path::Path;
use tracing::{debug, warn};

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "route-rbac.toml",
    ".route-rbac.toml",
    "~/.config/route-rbac/config.toml",
    "/etc/route-rbac/config.toml",
];

/// Prefix for environment variables that hold a role's default permissions
const ROLE_GRANT_ENV_PREFIX: &str = "PERMISSIONS_";

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> ConfigResult<AppConfig> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> ConfigResult<AppConfig> {
    let mut builder = Config::builder();

    // 1. Start with defaults (handled by serde defaults on AppConfig)

    // 2. Add configuration file
    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // Try default paths (first existing one wins)
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                debug!(path = %expanded, "Using configuration file");
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // 3. Add environment variables with ROUTE_RBAC prefix
    // e.g., ROUTE_RBAC__POLICY__STRATEGY, ROUTE_RBAC__GUARD__SIGN_IN_PATH
    // Double underscore (__) maps to nested keys (policy.strategy)
    builder = builder.add_source(
        Environment::with_prefix("ROUTE_RBAC")
            .separator("__")
            .try_parsing(true),
    );

    // Build and deserialize
    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let mut app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    // 4. Per-role grant lists, applied on top of the deserialized grants
    apply_role_grant_overrides(&mut app_config, |var| std::env::var(var).ok())?;

    // Validate the configuration
    validate_config(&app_config)?;

    Ok(app_config)
}

/// Replace a role's grants from `PERMISSIONS_<ROLE>`, a comma separated list
/// such as `PERMISSIONS_EDITOR=write_content,edit_content`.
///
/// Only roles with a variable set are touched; the others keep their grants
/// from the file or the defaults. An empty value clears the role's grants.
fn apply_role_grant_overrides<F>(config: &mut AppConfig, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    for role in Role::all() {
        let var = format!("{}{}", ROLE_GRANT_ENV_PREFIX, role.as_str().to_uppercase());
        let Some(raw) = lookup(&var) else {
            continue;
        };

        let grants = split_list(&raw)
            .into_iter()
            .map(|name| {
                Permission::try_parse(name).ok_or_else(|| {
                    ConfigError::invalid(format!("{}: unknown permission '{}'", var, name))
                })
            })
            .collect::<ConfigResult<Vec<_>>>()?;

        debug!(variable = var.as_str(), count = grants.len(), "Applying role grant override");
        config.roles.grants.insert(role.to_string(), grants);
    }

    Ok(())
}

/// Split a comma separated list, dropping blanks
fn split_list(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Validate configuration values by compiling every part of the policy
fn validate_config(config: &AppConfig) -> ConfigResult<()> {
    RoleConfig::new(&config.roles)?;

    let resolver = AccessResolver::from_config(config)?;
    for shadowed in resolver.policy().shadowed_rules() {
        warn!("{}", shadowed);
    }

    RouteGuard::new(resolver, &config.guard)?;

    for (section, items) in &config.menus.0 {
        validate_menu_items(items, &format!("menus.{}", section))?;
    }

    if config.logging.level.trim().is_empty() {
        return Err(ConfigError::Missing {
            field: "logging.level".to_string(),
        });
    }

    Ok(())
}

/// Validate that every menu entry has a label and an absolute href
fn validate_menu_items(items: &[MenuItem], field_path: &str) -> ConfigResult<()> {
    for item in items {
        if item.label.trim().is_empty() {
            return Err(ConfigError::invalid(format!(
                "{}: menu entry '{}' has an empty label",
                field_path, item.href
            )));
        }
        if !item.href.starts_with('/') {
            return Err(ConfigError::invalid(format!(
                "{}: menu entry '{}' has href '{}', expected an absolute path",
                field_path, item.label, item.href
            )));
        }
        validate_menu_items(&item.children, field_path)?;
    }
    Ok(())
}

/// Compile the menus of a validated configuration
pub fn menus_from_config(config: &AppConfig) -> Menus {
    Menus::new(&config.menus)
}
