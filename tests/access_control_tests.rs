//! Route access control integration tests
//!
//! This test suite covers:
//! - Wildcard pattern semantics (`*` one segment, `**` any depth)
//! - Tier precedence (public, authenticated-only, protected)
//! - Admin-only and permission-gated rules across every role
//! - First-match ordering of protected rules
//! - The menu-driven strategy, which denies routes missing from every menu
//! - Route guard outcomes and identity resolution
//! - Concurrent decisions over a shared resolver
//!
//! Unless stated otherwise tests run against the built-in default policy.

use rstest::rstest;
use route_rbac::access_control::patterns;
use route_rbac::access_control::{
    AccessDecision, AccessResolver, AuthorizationContext, DenyReason, GuardOutcome,
    IdentityClaims, Permission, PolicyTable, Role, RoleConfig, RouteGuard,
};
use route_rbac::config::{AppConfig, PolicyConfig, PolicyStrategy, RouteRuleConfig};
use std::sync::Arc;

// =============================================================================
// Test Helpers
// =============================================================================

fn default_resolver() -> AccessResolver {
    AccessResolver::from_config(&AppConfig::default()).unwrap()
}

fn resolver_with_rules(protected: Vec<RouteRuleConfig>) -> AccessResolver {
    let config = PolicyConfig {
        public: vec![],
        authenticated: vec![],
        protected,
        ..Default::default()
    };
    AccessResolver::new(PolicyTable::new(&config).unwrap())
}

fn roles() -> RoleConfig {
    RoleConfig::new(&AppConfig::default().roles).unwrap()
}

fn user(role: Role) -> AuthorizationContext {
    roles().context_for(format!("{}_1", role), role, [])
}

fn anonymous() -> AuthorizationContext {
    AuthorizationContext::unauthenticated()
}

/// Every role paired with every subset of permissions, plus the anonymous caller
fn all_contexts() -> Vec<AuthorizationContext> {
    let mut contexts = vec![anonymous()];
    for role in Role::all() {
        for mask in 0..(1u8 << Permission::all().len()) {
            let permissions = Permission::all()
                .iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1 << bit) != 0)
                .map(|(_, p)| *p);
            contexts.push(AuthorizationContext::authenticated(
                format!("{}_{}", role, mask),
                *role,
                permissions,
            ));
        }
    }
    contexts
}

// =============================================================================
// 1. Pattern Matching
// =============================================================================

mod pattern_matching {
    use super::*;

    #[rstest]
    #[case::deep_edit("/content/edit/**", "/content/edit/123", true)]
    #[case::deeper_edit("/content/edit/**", "/content/edit/123/history", true)]
    #[case::bare_prefix("/content/edit/**", "/content/edit", false)]
    #[case::trailing_slash("/content/edit/**", "/content/edit/", true)]
    #[case::sibling_prefix("/content/edit/**", "/content/editor", false)]
    #[case::single_segment("/a/*/edit", "/a/7/edit", true)]
    #[case::single_segment_no_slash("/a/*/edit", "/a/7/8/edit", false)]
    #[case::single_segment_empty("/a/*", "/a/", true)]
    #[case::literal_dot("/files/*.pdf", "/files/report.pdf", true)]
    #[case::dot_is_not_wildcard("/files/*.pdf", "/files/reportXpdf", false)]
    #[case::case_sensitive("/about", "/About", false)]
    #[case::exact_no_trailing_slash("/u", "/u/", false)]
    #[case::exact("/settings/account", "/settings/account", true)]
    #[case::root("/", "/", true)]
    #[case::root_is_exact("/", "/about", false)]
    #[case::catch_all("/**", "/anything/at/all", true)]
    fn test_wildcards(#[case] pattern: &str, #[case] path: &str, #[case] expected: bool) {
        assert_eq!(
            patterns::matches(pattern, path).unwrap(),
            expected,
            "pattern '{}' vs path '{}'",
            pattern,
            path
        );
    }

    #[rstest]
    #[case::empty("")]
    #[case::relative("content/**")]
    #[case::triple_star("/a/***")]
    fn test_invalid_patterns(#[case] pattern: &str) {
        assert!(patterns::matches(pattern, "/a").is_err());
    }
}

// =============================================================================
// 2. Tier Properties
// =============================================================================

mod tier_properties {
    use super::*;

    #[test]
    fn test_public_allowed_for_every_context() {
        let resolver = default_resolver();
        let paths = ["/", "/sign-in", "/404", "/terms", "/api/public/health/live"];

        for ctx in all_contexts() {
            for path in paths {
                assert!(
                    resolver.decide(path, &ctx).is_allowed(),
                    "{} denied for {:?}",
                    path,
                    ctx
                );
            }
        }
    }

    #[test]
    fn test_public_beats_protected() {
        let config = PolicyConfig {
            public: vec!["/docs/**".into()],
            authenticated: vec![],
            protected: vec![RouteRuleConfig::admin_only("/docs/**")],
            ..Default::default()
        };
        let resolver = AccessResolver::new(PolicyTable::new(&config).unwrap());

        assert!(resolver.decide("/docs/intro", &anonymous()).is_allowed());
    }

    #[test]
    fn test_authenticated_beats_protected() {
        let config = PolicyConfig {
            public: vec![],
            authenticated: vec!["/me/**".into()],
            protected: vec![RouteRuleConfig::admin_only("/me/**")],
            ..Default::default()
        };
        let resolver = AccessResolver::new(PolicyTable::new(&config).unwrap());

        assert!(resolver.decide("/me/settings", &user(Role::Viewer)).is_allowed());
        assert_eq!(
            resolver.decide("/me/settings", &anonymous()),
            AccessDecision::Denied(DenyReason::AuthenticationRequired)
        );
    }

    #[test]
    fn test_admin_only_iff_admin() {
        let resolver = resolver_with_rules(vec![RouteRuleConfig::admin_only("/ops/**")]);

        for ctx in all_contexts() {
            let expected = ctx.role() == Some(Role::Admin);
            assert_eq!(
                resolver.decide("/ops/deploy", &ctx).is_allowed(),
                expected,
                "{:?}",
                ctx
            );
        }
    }

    #[rstest]
    #[case::single(&[Permission::ManageUser])]
    #[case::pair(&[Permission::WriteContent, Permission::EditContent])]
    #[case::all(&[Permission::WriteContent, Permission::EditContent, Permission::ManageUser])]
    fn test_permission_rule_iff_intersection(#[case] required: &[Permission]) {
        let resolver =
            resolver_with_rules(vec![RouteRuleConfig::permissions("/gated/**", required)]);

        for ctx in all_contexts() {
            let expected = ctx.is_authenticated() && ctx.has_any_permission(required);
            assert_eq!(
                resolver.decide("/gated/x", &ctx).is_allowed(),
                expected,
                "{:?} against {:?}",
                ctx,
                required
            );
        }
    }

    #[test]
    fn test_empty_permission_rule_admits_any_signed_in_user() {
        let resolver = resolver_with_rules(vec![RouteRuleConfig::permissions("/inbox", &[])]);

        for ctx in all_contexts() {
            assert_eq!(
                resolver.decide("/inbox", &ctx).is_allowed(),
                ctx.is_authenticated()
            );
        }
    }

    #[test]
    fn test_unmatched_route_is_allowed() {
        let resolver = default_resolver();

        for ctx in all_contexts() {
            assert!(resolver.decide("/blog/2024/hello", &ctx).is_allowed());
        }
    }

    #[test]
    fn test_unauthenticated_never_reaches_protected() {
        let resolver = default_resolver();

        for path in ["/a", "/content/create", "/api/users/1", "/test/viewer"] {
            assert_eq!(
                resolver.decide(path, &anonymous()),
                AccessDecision::Denied(DenyReason::AuthenticationRequired),
                "{}",
                path
            );
        }
    }
}

// =============================================================================
// 3. Rule Ordering
// =============================================================================

mod rule_ordering {
    use super::*;

    fn editor() -> AuthorizationContext {
        user(Role::Editor)
    }

    #[test]
    fn test_broad_rule_first_wins() {
        let resolver = resolver_with_rules(vec![
            RouteRuleConfig::admin_only("/reports/**"),
            RouteRuleConfig::permissions("/reports/public/**", &[Permission::WriteContent]),
        ]);

        assert_eq!(
            resolver.decide("/reports/public/q3", &editor()),
            AccessDecision::Denied(DenyReason::AdminRequired)
        );
    }

    #[test]
    fn test_narrow_rule_first_wins() {
        let resolver = resolver_with_rules(vec![
            RouteRuleConfig::permissions("/reports/public/**", &[Permission::WriteContent]),
            RouteRuleConfig::admin_only("/reports/**"),
        ]);

        assert!(resolver.decide("/reports/public/q3", &editor()).is_allowed());
        assert_eq!(
            resolver.decide("/reports/private/q3", &editor()),
            AccessDecision::Denied(DenyReason::AdminRequired)
        );
    }

    #[test]
    fn test_default_user_routes_precede_admin_catch_all() {
        let resolver = default_resolver();
        let user_manager = roles().context_for("hr_1", Role::Editor, [Permission::ManageUser]);

        assert!(resolver.decide("/a/users/5", &user_manager).is_allowed());
        assert!(resolver.decide("/a/users/profile/edit", &user_manager).is_allowed());
        assert_eq!(
            resolver.decide("/a/users/roles/5", &user_manager),
            AccessDecision::Denied(DenyReason::AdminRequired)
        );
        assert_eq!(
            resolver.decide("/a/settings", &user_manager),
            AccessDecision::Denied(DenyReason::AdminRequired)
        );
    }
}

// =============================================================================
// 4. Default Policy Scenarios
// =============================================================================

mod scenarios {
    use super::*;

    #[test]
    fn test_editor_may_delete_content() {
        let decision = default_resolver().decide("/content/delete/9", &user(Role::Editor));
        assert!(decision.is_allowed());
    }

    #[test]
    fn test_editor_denied_admin_area() {
        let decision = default_resolver().decide("/a/users", &user(Role::Editor));
        assert_eq!(decision.reason().as_deref(), Some("Admin access required"));
    }

    #[test]
    fn test_anonymous_denied_user_area() {
        let decision = default_resolver().decide("/u/settings", &anonymous());
        assert_eq!(decision.reason().as_deref(), Some("Authentication required"));
    }

    #[test]
    fn test_editor_missing_manage_user() {
        let decision = default_resolver().decide("/a/users/5", &user(Role::Editor));
        assert_eq!(
            decision.reason().as_deref(),
            Some("Required permissions: manage_user. User has: write_content, edit_content")
        );
    }

    #[test]
    fn test_viewer_has_nothing() {
        let decision = default_resolver().decide("/test/editor", &user(Role::Viewer));
        assert_eq!(
            decision.reason().as_deref(),
            Some("Required permissions: write_content, edit_content. User has: none")
        );
    }

    #[rstest]
    #[case::viewer_test_page(Role::Viewer, "/test/viewer", true)]
    #[case::viewer_account(Role::Viewer, "/settings/account", true)]
    #[case::viewer_user_settings(Role::Viewer, "/settings/user/theme", true)]
    #[case::viewer_create(Role::Viewer, "/content/create", false)]
    #[case::editor_create(Role::Editor, "/content/create", true)]
    #[case::editor_publish(Role::Editor, "/content/publish/7", true)]
    #[case::editor_content_api(Role::Editor, "/api/content/posts", true)]
    #[case::editor_users_api(Role::Editor, "/api/users/3", false)]
    #[case::editor_system_settings(Role::Editor, "/settings/system/mail", false)]
    #[case::editor_admin_api(Role::Editor, "/api/a/stats", false)]
    #[case::admin_root(Role::Admin, "/a", true)]
    #[case::admin_roles(Role::Admin, "/a/users/roles/3", true)]
    #[case::admin_system_settings(Role::Admin, "/settings/system/mail", true)]
    #[case::admin_test_admin(Role::Admin, "/test/admin", true)]
    #[case::editor_test_admin(Role::Editor, "/test/admin", false)]
    fn test_default_policy(#[case] role: Role, #[case] path: &str, #[case] allowed: bool) {
        assert_eq!(
            default_resolver().decide(path, &user(role)).is_allowed(),
            allowed,
            "{} on {}",
            role,
            path
        );
    }

    #[test]
    fn test_require_error_message() {
        let err = default_resolver()
            .require("/a", &user(Role::Viewer))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Access denied for route '/a': Admin access required"
        );
    }
}

// =============================================================================
// 5. Menu Strategy
// =============================================================================

mod menu_strategy {
    use super::*;

    fn menu_resolver() -> AccessResolver {
        let mut config = AppConfig::default();
        config.policy.strategy = PolicyStrategy::Menu;
        AccessResolver::from_config(&config).unwrap()
    }

    #[test]
    fn test_strategy_selected() {
        assert_eq!(menu_resolver().strategy(), PolicyStrategy::Menu);
        assert_eq!(default_resolver().strategy(), PolicyStrategy::RouteTable);
    }

    #[test]
    fn test_unlisted_route_denied_for_everyone() {
        let resolver = menu_resolver();

        for ctx in [anonymous(), user(Role::Viewer), user(Role::Admin)] {
            let decision = resolver.decide("/blog/post", &ctx);
            assert_eq!(
                decision.reason().as_deref(),
                Some("Route '/blog/post' not found in any menu configuration")
            );
        }
    }

    #[rstest]
    #[case("/418")]
    #[case("/502")]
    fn test_error_pages_allowed(#[case] path: &str) {
        assert!(menu_resolver().decide(path, &anonymous()).is_allowed());
    }

    #[test]
    fn test_role_gated_entries() {
        let resolver = menu_resolver();

        assert!(resolver.decide("/test/admin", &user(Role::Admin)).is_allowed());
        assert!(resolver.decide("/test/viewer", &user(Role::Viewer)).is_allowed());
        assert!(resolver.decide("/test/components", &user(Role::Editor)).is_allowed());

        // Roles are tags, not a hierarchy
        let decision = resolver.decide("/test/viewer", &user(Role::Admin));
        let reason = decision.reason().unwrap();
        assert!(reason.starts_with("Insufficient permissions. Required: viewer."));
        assert!(reason.contains("role admin"));
    }

    #[test]
    fn test_entry_without_requirements() {
        let resolver = menu_resolver();
        assert!(resolver.decide("/test", &user(Role::Viewer)).is_allowed());
        assert!(resolver.decide("/test", &anonymous()).is_allowed());
    }

    #[test]
    fn test_earlier_tiers_still_apply() {
        let resolver = menu_resolver();

        assert!(resolver.decide("/about", &anonymous()).is_allowed());
        assert_eq!(
            resolver.decide("/u/settings", &anonymous()),
            AccessDecision::Denied(DenyReason::AuthenticationRequired)
        );
    }
}

// =============================================================================
// 6. Route Guard and Identity
// =============================================================================

mod guard {
    use super::*;

    fn guard() -> RouteGuard {
        let config = AppConfig::default();
        RouteGuard::new(AccessResolver::from_config(&config).unwrap(), &config.guard).unwrap()
    }

    #[test]
    fn test_lookup_failure_goes_to_sign_in() {
        let roles = roles();
        let lookup: Result<Option<IdentityClaims>, String> = Err("session store offline".into());
        let ctx = AuthorizationContext::from_lookup(lookup, |claims| roles.resolve(claims));

        let outcome = guard().evaluate("/content/create", &ctx);
        assert_eq!(outcome.location(), Some("/sign-in"));
    }

    #[test]
    fn test_resolved_claims_go_to_forbidden() {
        let roles = roles();
        let claims = IdentityClaims {
            user_id: "user_42".into(),
            role: Some("editor".into()),
            permissions: vec![],
        };
        let ctx = AuthorizationContext::from_lookup(Ok::<_, String>(Some(claims)), |c| {
            roles.resolve(c)
        });

        assert!(guard().evaluate("/content/create", &ctx).is_continue());
        assert!(matches!(
            guard().evaluate("/a/users/roles/1", &ctx),
            GuardOutcome::Forbidden { location, .. } if location == "/403"
        ));
    }

    #[test]
    fn test_override_grants_access() {
        let roles = roles();
        let claims = IdentityClaims {
            user_id: "user_43".into(),
            role: Some("viewer".into()),
            permissions: vec!["manage_user".into()],
        };
        let ctx = roles.resolve(&claims);

        assert!(guard().evaluate("/api/users/3", &ctx).is_continue());
    }

    #[test]
    fn test_outcome_serializes_with_tag() {
        let outcome = guard().evaluate("/profile", &anonymous());
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["outcome"], "sign_in");
        assert_eq!(json["location"], "/sign-in");
        assert_eq!(json["reason"], "Authentication required");
    }
}

// =============================================================================
// 7. Concurrency
// =============================================================================

mod concurrency {
    use super::*;

    #[test]
    fn test_parallel_decisions_match_sequential() {
        let resolver = Arc::new(default_resolver());
        let paths = [
            "/",
            "/a",
            "/a/users/5",
            "/content/edit/1",
            "/u/x",
            "/test/viewer",
            "/blog",
        ];
        let contexts = Arc::new(all_contexts());

        let expected: Vec<bool> = contexts
            .iter()
            .flat_map(|ctx| {
                paths
                    .iter()
                    .map(|p| resolver.decide(p, ctx).is_allowed())
                    .collect::<Vec<_>>()
            })
            .collect();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let resolver = Arc::clone(&resolver);
                let contexts = Arc::clone(&contexts);
                std::thread::spawn(move || {
                    contexts
                        .iter()
                        .flat_map(|ctx| {
                            paths
                                .iter()
                                .map(|p| resolver.decide(p, ctx).is_allowed())
                                .collect::<Vec<_>>()
                        })
                        .collect::<Vec<bool>>()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    }

    #[test]
    fn test_core_types_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}

        assert_send_sync::<AccessResolver>();
        assert_send_sync::<RouteGuard>();
        assert_send_sync::<AuthorizationContext>();
        assert_send_sync::<PolicyTable>();
    }
}
