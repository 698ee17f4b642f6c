//! Configuration
//!
//! Role grants, route tiers, menus and guard targets, loaded from TOML and
//! the environment and validated before use.

pub mod loader;
pub mod types;

pub use loader::{load_config, load_config_from_str, menus_from_config};
pub use types::*;
