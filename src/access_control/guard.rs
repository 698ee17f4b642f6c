//! Route guard
//!
//! Turns a decision into what the request layer should do next. Denied
//! callers who are not signed in go to the sign-in page; signed-in callers go
//! to the forbidden page. No HTTP types are involved.

use crate::access_control::context::AuthorizationContext;
use crate::access_control::resolver::{AccessDecision, AccessResolver};
use crate::config::GuardConfig;
use crate::error::ConfigError;
use serde::Serialize;
use tracing::info;

/// What the request layer should do with a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum GuardOutcome {
    /// Serve the request
    Continue,
    /// Send the caller to sign in
    SignIn { location: String, reason: String },
    /// Caller is signed in but not permitted
    Forbidden { location: String, reason: String },
}

impl GuardOutcome {
    pub fn is_continue(&self) -> bool {
        matches!(self, GuardOutcome::Continue)
    }

    /// Redirect target, if any
    pub fn location(&self) -> Option<&str> {
        match self {
            GuardOutcome::Continue => None,
            GuardOutcome::SignIn { location, .. } | GuardOutcome::Forbidden { location, .. } => {
                Some(location)
            }
        }
    }
}

/// Resolver plus redirect targets
#[derive(Debug, Clone)]
pub struct RouteGuard {
    resolver: AccessResolver,
    sign_in_path: String,
    forbidden_path: String,
}

impl RouteGuard {
    pub fn new(resolver: AccessResolver, config: &GuardConfig) -> Result<Self, ConfigError> {
        for (field, value) in [
            ("guard.sign_in_path", &config.sign_in_path),
            ("guard.forbidden_path", &config.forbidden_path),
        ] {
            if !value.starts_with('/') {
                return Err(ConfigError::invalid(format!(
                    "{} must be an absolute path, got: '{}'",
                    field, value
                )));
            }
        }

        Ok(Self {
            resolver,
            sign_in_path: config.sign_in_path.clone(),
            forbidden_path: config.forbidden_path.clone(),
        })
    }

    pub fn resolver(&self) -> &AccessResolver {
        &self.resolver
    }

    /// Decide and map the decision onto a guard outcome
    pub fn evaluate(&self, path: &str, context: &AuthorizationContext) -> GuardOutcome {
        self.outcome(path, &self.resolver.decide(path, context), context)
    }

    /// Map a decision already taken for `path` onto a guard outcome
    pub fn outcome(
        &self,
        path: &str,
        decision: &AccessDecision,
        context: &AuthorizationContext,
    ) -> GuardOutcome {
        let reason = match decision {
            AccessDecision::Allowed => return GuardOutcome::Continue,
            AccessDecision::Denied(reason) => reason.to_string(),
        };

        if context.is_authenticated() {
            info!(
                path,
                user_id = context.user_id().unwrap_or_default(),
                reason = reason.as_str(),
                "Forbidden"
            );
            GuardOutcome::Forbidden {
                location: self.forbidden_path.clone(),
                reason,
            }
        } else {
            info!(path, reason = reason.as_str(), "Sign-in required");
            GuardOutcome::SignIn {
                location: self.sign_in_path.clone(),
                reason,
            }
        }
    }
}
