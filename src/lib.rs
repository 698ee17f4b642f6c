//! Route RBAC
//!
//! Role-based route protection for web applications. Given a request path and
//! the caller's authorization context, decides whether the request may proceed
//! and filters navigation menus down to what the caller can reach.
//!
//! ## Features
//!
//! - **Three-tier route policy**: public, authenticated-only and protected routes
//! - **Wildcard patterns**: `*` matches one path segment, `**` matches any depth
//! - **Permission-aware menus** that keep a parent when any child survives
//! - **Route guard** mapping denials onto sign-in or forbidden redirects
//! - **Flexible configuration** via TOML files and environment variables
//!
//! ## Example
//!
//! ```no_run
//! use route_rbac::access_control::{AccessResolver, AuthorizationContext, Role};
//! use route_rbac::config::load_config;
//!
//! let config = load_config(None)?;
//! let resolver = AccessResolver::from_config(&config)?;
//!
//! let editor = AuthorizationContext::authenticated("u_1", Role::Editor, []);
//! if resolver.decide("/a/users", &editor).is_denied() {
//!     // redirect to /403
//! }
//! # Ok::<(), route_rbac::AppError>(())
//! ```

pub mod access_control;
pub mod config;
pub mod error;

// Re-export main types
pub use access_control::{AccessDecision, AccessResolver, AuthorizationContext, filter_menu};
pub use config::{AppConfig, load_config};
pub use error::{AppError, Result};
