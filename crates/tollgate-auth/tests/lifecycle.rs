mod common;

use chrono::Duration;
use serde_json::json;

use tollgate_auth::password::digest_token;
use tollgate_auth::{AuthError, BindingAttribute, RegisterRequest};
use tollgate_core::events::{EventPayload, RevocationReason, SessionEvent, UserEvent};
use tollgate_core::traits::Clock;
use tollgate_core::types::RequestContext;
use tollgate_database::{TenantRepository, UserRepository};
use tollgate_entity::tenant::TenantStatus;

use common::{PASSWORD, ctx, harness, harness_with, session_settings};

#[tokio::test]
async fn test_register_issues_session_keyed_by_token_hash() {
    let h = harness();
    let issued = h
        .services
        .sessions
        .register(
            RegisterRequest {
                email: "a@x.com".into(),
                password: "valid pass 1234".into(),
                display_name: Some("A".into()),
                tenant_id: None,
            },
            &ctx(),
        )
        .await
        .unwrap();

    assert_eq!(issued.user.email, "a@x.com");
    let rows = h.store.all_sessions().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, issued.session_id);
    assert_eq!(rows[0].token_hash, digest_token(&issued.refresh_token));
    assert_ne!(rows[0].token_hash, issued.refresh_token);
    assert_eq!(rows[0].ip_address.as_deref(), Some("1.1.1.1"));

    let profile = h
        .store
        .find_profile(issued.user.tenant_id, issued.user.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.display_name.as_deref(), Some("A"));

    let principal = h
        .services
        .gate
        .authenticate(&issued.access_token)
        .await
        .unwrap();
    assert_eq!(principal.session_id, issued.session_id);

    assert_eq!(
        h.events.names(),
        vec!["user.registered", "session.created"]
    );
}

#[tokio::test]
async fn test_register_duplicate_email_is_conflict() {
    let h = harness();
    h.register(None, "a@x.com").await.unwrap();
    let err = h.register(None, "A@X.com ").await.unwrap_err();
    assert!(matches!(err, AuthError::UserExists));
}

#[tokio::test]
async fn test_huge_timeout_override_does_not_break_refresh() {
    let h = harness();
    let tenant = h
        .tenant(
            "acme",
            session_settings(json!({
                "idleTimeoutMinutes": 1_000_000_000_000_000u64,
                "absoluteTimeoutMinutes": u64::MAX,
            })),
        )
        .await;
    let first = h.register(Some(tenant.id), "a@x.com").await.unwrap();

    h.clock.advance(Duration::days(1));
    let rotated = h
        .services
        .sessions
        .refresh(&first.refresh_token, &ctx())
        .await
        .unwrap();
    assert_eq!(rotated.old_session_id, first.session_id);
}

#[tokio::test]
async fn test_register_and_login_agree_on_email_spelling() {
    let h = harness();
    let issued = h.register(None, "  B@X.com ").await.unwrap();
    assert_eq!(issued.user.email, "b@x.com");

    let again = h.login(None, " b@x.COM", PASSWORD).await.unwrap();
    assert_eq!(again.user.id, issued.user.id);
}

#[tokio::test]
async fn test_register_enforces_password_rules() {
    let h = harness();
    let register = |password: &str| RegisterRequest {
        email: "a@x.com".into(),
        password: password.into(),
        display_name: None,
        tenant_id: None,
    };

    let err = h
        .services
        .sessions
        .register(register("short1"), &ctx())
        .await
        .unwrap_err();
    match err {
        AuthError::PasswordPolicyViolation { unmet } => {
            assert_eq!(unmet, vec!["at least 12 characters".to_string()]);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = h
        .services
        .sessions
        .register(register("LetMeIn12345"), &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::PasswordPolicyViolation { .. }));
    assert_eq!(h.store.session_count().await, 0);
}

#[tokio::test]
async fn test_register_into_unknown_tenant_fails() {
    let h = harness();
    let err = h
        .register(Some(uuid::Uuid::new_v4()), "a@x.com")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TenantNotFound));
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let h = harness();
    let user = h.register(None, "a@x.com").await.unwrap().user;
    h.events.clear();

    let wrong_password = h.login(None, "a@x.com", "wrong pass 9999").await;
    let unknown_email = h.login(None, "b@x.com", PASSWORD).await;
    assert!(matches!(wrong_password, Err(AuthError::InvalidCredentials)));
    assert!(matches!(unknown_email, Err(AuthError::InvalidCredentials)));
    assert_eq!(
        h.events.names(),
        vec!["session.login_failed", "session.login_failed"]
    );

    h.store
        .set_active(user.tenant_id, user.id, false)
        .await
        .unwrap();
    let inactive = h.login(None, "a@x.com", PASSWORD).await;
    assert!(matches!(inactive, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn test_login_rejects_inactive_tenant() {
    let h = harness();
    let user = h.register(None, "a@x.com").await.unwrap().user;
    TenantRepository::update_status(&h.store, user.tenant_id, TenantStatus::Disabled)
        .await
        .unwrap();

    match h.login(None, "a@x.com", PASSWORD).await {
        Err(AuthError::TenantInactive { tenant_id, status }) => {
            assert_eq!(tenant_id, user.tenant_id);
            assert_eq!(status, TenantStatus::Disabled);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn test_rotation_is_exactly_once() {
    let h = harness();
    let first = h.register(None, "a@x.com").await.unwrap();

    let second = h
        .services
        .sessions
        .refresh(&first.refresh_token, &ctx())
        .await
        .unwrap();
    assert_eq!(second.old_session_id, first.session_id);
    assert_ne!(second.session_id, first.session_id);
    assert_ne!(second.refresh_token, first.refresh_token);

    let replay = h
        .services
        .sessions
        .refresh(&first.refresh_token, &ctx())
        .await;
    assert!(matches!(replay, Err(AuthError::InvalidCredentials)));

    let third = h
        .services
        .sessions
        .refresh(&second.refresh_token, &ctx())
        .await
        .unwrap();
    assert_eq!(third.old_session_id, second.session_id);
    assert_eq!(h.store.session_count().await, 1);

    let rotated: Vec<_> = h
        .events
        .session_events()
        .into_iter()
        .filter(|e| matches!(e, SessionEvent::Rotated { .. }))
        .collect();
    assert_eq!(rotated.len(), 2);
}

#[tokio::test]
async fn test_rotation_keeps_creation_time_and_binding_context() {
    let h = harness();
    let first = h.register(None, "a@x.com").await.unwrap();
    let created_at = h.store.all_sessions().await[0].created_at;

    h.clock.advance(Duration::minutes(5));
    let rotated = h
        .services
        .sessions
        .refresh(&first.refresh_token, &ctx())
        .await
        .unwrap();

    let row = &h.store.all_sessions().await[0];
    assert_eq!(row.id, rotated.session_id);
    assert_eq!(row.created_at, created_at);
    assert_eq!(row.last_active_at, Some(h.clock.now()));
    assert_eq!(row.ip_address.as_deref(), Some("1.1.1.1"));
    assert_eq!(row.device_fingerprint.as_deref(), Some("device-a"));
}

#[tokio::test]
async fn test_garbled_refresh_token_is_invalid_credentials() {
    let h = harness();
    let err = h
        .services
        .sessions
        .refresh("not-a-token", &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn test_logout_twice_reports_revoked() {
    let h = harness();
    let issued = h.register(None, "a@x.com").await.unwrap();

    let ended = h
        .services
        .sessions
        .logout(&issued.refresh_token)
        .await
        .unwrap();
    assert_eq!(ended, issued.session_id);

    let again = h.services.sessions.logout(&issued.refresh_token).await;
    assert!(matches!(again, Err(AuthError::SessionRevoked)));

    let refresh = h
        .services
        .sessions
        .refresh(&issued.refresh_token, &ctx())
        .await;
    assert!(matches!(refresh, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn test_reject_newest_caps_sessions_at_max() {
    let h = harness();
    let tenant = h
        .tenant(
            "acme",
            session_settings(json!({
                "maxConcurrentSessions": 3,
                "concurrentSessionStrategy": "reject_newest"
            })),
        )
        .await;
    let user = h.register(Some(tenant.id), "a@x.com").await.unwrap().user;

    for _ in 0..2 {
        h.login(Some(tenant.id), "a@x.com", PASSWORD).await.unwrap();
    }
    let err = h
        .login(Some(tenant.id), "a@x.com", PASSWORD)
        .await
        .unwrap_err();
    match err {
        AuthError::SessionConcurrentLimit { max, current } => {
            assert_eq!(max, 3);
            assert_eq!(current, 3);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let listed = h
        .services
        .sessions
        .list_sessions(tenant.id, user.id, None)
        .await
        .unwrap();
    assert_eq!(listed.len(), 3);
}

#[tokio::test]
async fn test_evict_oldest_makes_room() {
    let h = harness();
    let tenant = h
        .tenant(
            "acme",
            session_settings(json!({
                "maxConcurrentSessions": 2,
                "concurrentSessionStrategy": "evict_oldest"
            })),
        )
        .await;
    let first = h.register(Some(tenant.id), "a@x.com").await.unwrap();
    h.clock.advance(Duration::seconds(1));
    let second = h.login(Some(tenant.id), "a@x.com", PASSWORD).await.unwrap();
    h.clock.advance(Duration::seconds(1));
    let third = h.login(Some(tenant.id), "a@x.com", PASSWORD).await.unwrap();

    let listed = h
        .services
        .sessions
        .list_sessions(tenant.id, first.user.id, Some(third.session_id))
        .await
        .unwrap();
    let ids: Vec<_> = listed.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![second.session_id, third.session_id]);
    assert!(listed[1].current);
    assert!(!listed[0].current);

    let evicted = h.events.session_events().into_iter().any(|e| {
        matches!(
            e,
            SessionEvent::Revoked { ref session_ids, reason: RevocationReason::Evicted, .. }
                if session_ids == &vec![first.session_id]
        )
    });
    assert!(evicted);
}

#[tokio::test]
async fn test_idle_timeout_boundary_is_expired() {
    let h = harness();
    let tenant = h
        .tenant("acme", session_settings(json!({ "idleTimeoutMinutes": 30 })))
        .await;
    let issued = h.register(Some(tenant.id), "a@x.com").await.unwrap();

    h.clock.advance(Duration::minutes(29));
    let rotated = h
        .services
        .sessions
        .refresh(&issued.refresh_token, &ctx())
        .await
        .unwrap();

    h.clock.advance(Duration::minutes(30));
    let err = h
        .services
        .sessions
        .refresh(&rotated.refresh_token, &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SessionIdleTimeout));
    assert!(err.terminates_session());
    assert_eq!(h.store.session_count().await, 0);
}

#[tokio::test]
async fn test_absolute_timeout_despite_activity() {
    let h = harness();
    let tenant = h
        .tenant(
            "acme",
            session_settings(json!({
                "idleTimeoutMinutes": 30,
                "absoluteTimeoutMinutes": 60
            })),
        )
        .await;
    let mut token = h
        .register(Some(tenant.id), "a@x.com")
        .await
        .unwrap()
        .refresh_token;

    for _ in 0..2 {
        h.clock.advance(Duration::minutes(20));
        token = h
            .services
            .sessions
            .refresh(&token, &ctx())
            .await
            .unwrap()
            .refresh_token;
    }

    h.clock.advance(Duration::minutes(20));
    let err = h
        .services
        .sessions
        .refresh(&token, &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SessionAbsoluteTimeout));
    assert_eq!(h.store.session_count().await, 0);
}

#[tokio::test]
async fn test_ip_binding_violation_deletes_session() {
    let h = harness();
    let tenant = h
        .tenant("acme", session_settings(json!({ "sessionBindingMode": "ip" })))
        .await;
    let issued = h.register(Some(tenant.id), "a@x.com").await.unwrap();

    let moved = RequestContext::from_ip("2.2.2.2").with_device("device-a");
    match h
        .services
        .sessions
        .refresh(&issued.refresh_token, &moved)
        .await
    {
        Err(AuthError::SessionBindingViolation { attributes }) => {
            assert_eq!(attributes, vec![BindingAttribute::IpAddress]);
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let retry = h
        .services
        .sessions
        .refresh(&issued.refresh_token, &ctx())
        .await;
    assert!(matches!(retry, Err(AuthError::InvalidCredentials)));
    assert_eq!(h.store.session_count().await, 0);
}

#[tokio::test]
async fn test_refresh_fails_closed_for_inactive_tenant() {
    let h = harness();
    let issued = h.register(None, "a@x.com").await.unwrap();
    TenantRepository::update_status(&h.store, issued.user.tenant_id, TenantStatus::Suspended)
        .await
        .unwrap();

    let err = h
        .services
        .sessions
        .refresh(&issued.refresh_token, &ctx())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AuthError::TenantInactive {
            status: TenantStatus::Suspended,
            ..
        }
    ));
}

#[tokio::test]
async fn test_refresh_rejects_deactivated_user() {
    let h = harness();
    let issued = h.register(None, "a@x.com").await.unwrap();
    h.store
        .set_active(issued.user.tenant_id, issued.user.id, false)
        .await
        .unwrap();
    let err = h
        .services
        .sessions
        .refresh(&issued.refresh_token, &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn test_expired_refresh_window_deletes_session() {
    let h = harness();
    let issued = h.register(None, "a@x.com").await.unwrap();
    h.clock.advance(Duration::days(30));

    let err = h
        .services
        .sessions
        .refresh(&issued.refresh_token, &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SessionExpired));
    assert_eq!(h.store.session_count().await, 0);
}

#[tokio::test]
async fn test_role_ceiling_overrides_tenant_timeouts() {
    let mut config = common::config();
    config
        .session
        .role_max_session_minutes
        .insert("member".into(), 45);
    let h = harness_with(config);
    let mut token = h.register(None, "a@x.com").await.unwrap().refresh_token;

    h.clock.advance(Duration::minutes(30));
    token = h
        .services
        .sessions
        .refresh(&token, &ctx())
        .await
        .unwrap()
        .refresh_token;

    h.clock.advance(Duration::minutes(15));
    let err = h
        .services
        .sessions
        .refresh(&token, &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SessionExpired));
    assert_eq!(h.store.session_count().await, 0);
}

#[tokio::test]
async fn test_abuse_guard_blocks_after_repeated_failures() {
    let mut config = common::config();
    config.abuse.max_attempts = 3;
    let h = harness_with(config);
    h.register(None, "a@x.com").await.unwrap();

    for _ in 0..3 {
        let err = h.login(None, "a@x.com", "wrong pass 9999").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
    let blocked = h.login(None, "a@x.com", PASSWORD).await.unwrap_err();
    assert!(matches!(blocked, AuthError::RateLimited { .. }));

    h.clock.advance(Duration::seconds(900));
    h.login(None, "a@x.com", PASSWORD).await.unwrap();
}

#[tokio::test]
async fn test_registration_event_carries_email() {
    let h = harness();
    let issued = h.register(None, "a@x.com").await.unwrap();
    let registered = h.events.events().into_iter().find_map(|e| match e.payload {
        EventPayload::User(UserEvent::Registered { user_id, email }) => Some((user_id, email)),
        _ => None,
    });
    assert_eq!(registered, Some((issued.user.id, "a@x.com".to_string())));
}
