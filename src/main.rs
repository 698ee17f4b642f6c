//! Route RBAC command line
//!
//! Checks a route against the configured policy, prints a caller's menus and
//! lints the policy for unreachable rules.

use clap::{Parser, Subcommand};
use route_rbac::{
    access_control::{
        AccessResolver, AuthorizationContext, GuardOutcome, Permission, Role, RoleConfig,
        RouteGuard,
    },
    config::{AppConfig, LogFormat, load_config, menus_from_config},
};
use serde::Serialize;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Route RBAC - role-based route protection and menu filtering
#[derive(Parser, Debug)]
#[command(name = "route-rbac")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "ROUTE_RBAC_CONFIG", global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error); defaults to logging.level
    #[arg(long, env = "ROUTE_RBAC_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

/// Caller identity flags shared by `check` and `menu`
#[derive(clap::Args, Debug)]
struct CallerArgs {
    /// Role of the signed-in caller; omit to check as an anonymous visitor
    #[arg(long, value_parser = parse_role)]
    role: Option<Role>,

    /// User id reported in logs and output
    #[arg(long, default_value = "cli-user")]
    user_id: String,

    /// Extra permission granted on top of the role defaults (repeatable)
    #[arg(long = "permission", value_parser = parse_permission)]
    permissions: Vec<Permission>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decide whether a caller may access a route (exit 1 when denied)
    Check {
        /// Normalized request path, e.g. /a/users
        path: String,

        #[command(flatten)]
        caller: CallerArgs,

        /// Print the decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the menus visible to a caller as JSON
    Menu {
        #[command(flatten)]
        caller: CallerArgs,

        /// Only print this menu section
        #[arg(long)]
        section: Option<String>,
    },

    /// Validate configuration and report unreachable protected rules
    Lint,
}

#[derive(Serialize)]
struct CheckReport<'a> {
    path: &'a str,
    allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    guard: &'a GuardOutcome,
    context: &'a AuthorizationContext,
}

fn parse_role(s: &str) -> Result<Role, String> {
    Role::try_parse(s).ok_or_else(|| {
        format!(
            "unknown role '{}', expected one of: {}",
            s,
            Role::all().iter().map(Role::as_str).collect::<Vec<_>>().join(", ")
        )
    })
}

fn parse_permission(s: &str) -> Result<Permission, String> {
    Permission::try_parse(s).ok_or_else(|| {
        format!(
            "unknown permission '{}', expected one of: {}",
            s,
            Permission::all()
                .iter()
                .map(Permission::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        )
    })
}

fn init_logging(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

/// Build the caller's context; no role means not signed in
fn caller_context(roles: &RoleConfig, caller: &CallerArgs) -> AuthorizationContext {
    match caller.role {
        Some(role) => roles.context_for(
            caller.user_id.as_str(),
            role,
            caller.permissions.iter().copied(),
        ),
        None => AuthorizationContext::unauthenticated(),
    }
}

fn run_check(
    config: &AppConfig,
    path: &str,
    caller: &CallerArgs,
    json: bool,
) -> anyhow::Result<ExitCode> {
    let roles = RoleConfig::new(&config.roles)?;
    let guard = RouteGuard::new(AccessResolver::from_config(config)?, &config.guard)?;
    let context = caller_context(&roles, caller);

    let decision = guard.resolver().decide(path, &context);
    let outcome = guard.outcome(path, &decision, &context);

    if json {
        let report = CheckReport {
            path,
            allowed: decision.is_allowed(),
            reason: decision.reason(),
            guard: &outcome,
            context: &context,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match (decision.reason(), outcome.location()) {
            (None, _) => println!("allowed: {}", path),
            (Some(reason), Some(location)) => {
                println!("denied: {} ({}), redirect to {}", path, reason, location)
            }
            (Some(reason), None) => println!("denied: {} ({})", path, reason),
        }
    }

    Ok(if decision.is_allowed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_menu(
    config: &AppConfig,
    caller: &CallerArgs,
    section: Option<&str>,
) -> anyhow::Result<ExitCode> {
    let roles = RoleConfig::new(&config.roles)?;
    let menus = menus_from_config(config);
    let context = caller_context(&roles, caller);

    let output = match section {
        Some(name) => {
            let Some(items) = menus.section(name) else {
                anyhow::bail!(
                    "unknown menu section '{}', available: {}",
                    name,
                    menus.section_names().collect::<Vec<_>>().join(", ")
                );
            };
            serde_json::to_string_pretty(&route_rbac::filter_menu(items, &context))?
        }
        None => serde_json::to_string_pretty(&menus.accessible(&context))?,
    };

    println!("{}", output);
    Ok(ExitCode::SUCCESS)
}

fn run_lint(config: &AppConfig) -> anyhow::Result<ExitCode> {
    let resolver = AccessResolver::from_config(config)?;
    let shadowed = resolver.policy().shadowed_rules();

    if shadowed.is_empty() {
        println!(
            "ok: {} protected rules, strategy {:?}",
            resolver.policy().protected_rules().count(),
            resolver.strategy()
        );
        return Ok(ExitCode::SUCCESS);
    }

    for rule in &shadowed {
        println!("{}", rule);
    }
    Ok(ExitCode::FAILURE)
}

fn main() -> anyhow::Result<ExitCode> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration before logging so logging.* can take effect
    let config = load_config(args.config.as_deref())?;

    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_logging(level, config.logging.format);

    debug!(
        version = env!("CARGO_PKG_VERSION"),
        strategy = ?config.policy.strategy,
        "Configuration loaded"
    );

    let result = match &args.command {
        Command::Check { path, caller, json } => run_check(&config, path, caller, *json),
        Command::Menu { caller, section } => run_menu(&config, caller, section.as_deref()),
        Command::Lint => run_lint(&config),
    };

    match &result {
        Ok(code) => debug!(?code, "Done"),
        Err(e) => error!(error = %e, "Command failed"),
    }

    result
}
