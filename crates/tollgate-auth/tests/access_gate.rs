mod common;

use chrono::Duration;
use serde_json::json;

use tollgate_auth::AuthError;
use tollgate_core::traits::Clock;
use tollgate_database::{SessionRepository, TenantRepository, UserRepository};
use tollgate_entity::tenant::TenantStatus;
use tollgate_entity::user::UserRole;

use common::{ctx, harness, harness_with};

#[tokio::test]
async fn test_valid_token_yields_principal() {
    let h = harness();
    let issued = h.register(None, "a@x.com").await.unwrap();

    let principal = h
        .services
        .gate
        .authenticate(&issued.access_token)
        .await
        .unwrap();
    assert_eq!(principal.user_id, issued.user.id);
    assert_eq!(principal.tenant_id, issued.user.tenant_id);
    assert_eq!(principal.session_id, issued.session_id);
    assert_eq!(principal.role, UserRole::Member);
    assert_eq!(principal.email, "a@x.com");
}

#[tokio::test]
async fn test_deleted_session_revokes_valid_token() {
    let h = harness();
    let issued = h.register(None, "a@x.com").await.unwrap();
    h.services
        .sessions
        .logout(&issued.refresh_token)
        .await
        .unwrap();

    let err = h
        .services
        .gate
        .authenticate(&issued.access_token)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SessionRevoked));
}

#[tokio::test]
async fn test_rotated_out_session_token_is_revoked() {
    let h = harness();
    let issued = h.register(None, "a@x.com").await.unwrap();
    let rotated = h
        .services
        .sessions
        .refresh(&issued.refresh_token, &ctx())
        .await
        .unwrap();

    let old = h.services.gate.authenticate(&issued.access_token).await;
    assert!(matches!(old, Err(AuthError::SessionRevoked)));
    h.services
        .gate
        .authenticate(&rotated.access_token)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_token_failures_are_invalid_credentials() {
    let h = harness();
    let issued = h.register(None, "a@x.com").await.unwrap();

    let garbage = h.services.gate.authenticate("garbage").await;
    assert!(matches!(garbage, Err(AuthError::InvalidCredentials)));

    h.clock.advance(Duration::minutes(15));
    let expired = h.services.gate.authenticate(&issued.access_token).await;
    assert!(matches!(expired, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn test_expired_session_row_is_session_expired() {
    let mut config = common::config();
    config.auth.access_token_ttl_minutes = 60 * 24 * 60;
    let h = harness_with(config);
    let issued = h.register(None, "a@x.com").await.unwrap();

    h.clock.advance(Duration::days(30));
    let err = h
        .services
        .gate
        .authenticate(&issued.access_token)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SessionExpired));
    assert_eq!(h.store.session_count().await, 0);
}

#[tokio::test]
async fn test_tenant_isolation() {
    let h = harness();
    let a = h.tenant("tenant-a", json!({})).await;
    let b = h.tenant("tenant-b", json!({})).await;
    let in_a = h.register(Some(a.id), "same@x.com").await.unwrap();
    let in_b = h.register(Some(b.id), "same@x.com").await.unwrap();
    assert_ne!(in_a.user.id, in_b.user.id);

    let principal = h
        .services
        .gate
        .authenticate(&in_a.access_token)
        .await
        .unwrap();
    assert_eq!(principal.tenant_id, a.id);
    assert_eq!(principal.user_id, in_a.user.id);

    let count = h.services.revocation.revoke_tenant(a.id, None).await.unwrap();
    assert_eq!(count, 1);
    assert!(
        SessionRepository::find_by_id(&h.store, b.id, in_b.session_id)
            .await
            .unwrap()
            .is_some()
    );
    h.services
        .gate
        .authenticate(&in_b.access_token)
        .await
        .unwrap();

    // A session ID is never resolvable through another tenant.
    assert!(
        SessionRepository::find_by_id(&h.store, a.id, in_b.session_id)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_inactive_tenant_or_user_fails_closed() {
    let h = harness();
    let issued = h.register(None, "a@x.com").await.unwrap();
    let tenant_id = issued.user.tenant_id;

    TenantRepository::update_status(&h.store, tenant_id, TenantStatus::Suspended)
        .await
        .unwrap();
    let err = h
        .services
        .gate
        .authenticate(&issued.access_token)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TenantInactive { .. }));

    TenantRepository::update_status(&h.store, tenant_id, TenantStatus::Active)
        .await
        .unwrap();
    h.store
        .set_active(tenant_id, issued.user.id, false)
        .await
        .unwrap();
    let err = h
        .services
        .gate
        .authenticate(&issued.access_token)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn test_touch_on_access_records_activity() {
    let mut config = common::config();
    config.session.touch_on_access = true;
    let h = harness_with(config);
    let issued = h.register(None, "a@x.com").await.unwrap();

    h.clock.advance(Duration::minutes(3));
    h.services
        .gate
        .authenticate(&issued.access_token)
        .await
        .unwrap();

    let row = SessionRepository::find_by_id(&h.store, issued.user.tenant_id, issued.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.last_active_at, Some(h.clock.now()));
}
