mod common;

use serde_json::json;
use uuid::Uuid;

use tollgate_auth::{AuthError, FederatedIdentity, FederatedRevocationOutcome, RoleChangeOutcome};
use tollgate_core::events::{RevocationReason, SessionEvent};
use tollgate_database::SessionRepository;
use tollgate_entity::user::UserRole;

use common::{PASSWORD, harness, session_settings};

#[tokio::test]
async fn test_revoke_single_session() {
    let h = harness();
    let first = h.register(None, "a@x.com").await.unwrap();
    let second = h.login(None, "a@x.com", PASSWORD).await.unwrap();
    let tenant_id = first.user.tenant_id;

    h.services
        .revocation
        .revoke_session(tenant_id, first.session_id, None)
        .await
        .unwrap();

    assert!(
        SessionRepository::find_by_id(&h.store, tenant_id, first.session_id)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        SessionRepository::find_by_id(&h.store, tenant_id, second.session_id)
            .await
            .unwrap()
            .is_some()
    );

    let again = h
        .services
        .revocation
        .revoke_session(tenant_id, first.session_id, None)
        .await;
    assert!(matches!(again, Err(AuthError::SessionNotFound)));
}

#[tokio::test]
async fn test_revoke_session_is_tenant_scoped() {
    let h = harness();
    let a = h.tenant("tenant-a", json!({})).await;
    let b = h.tenant("tenant-b", json!({})).await;
    let in_b = h.register(Some(b.id), "u@x.com").await.unwrap();

    let err = h
        .services
        .revocation
        .revoke_session(a.id, in_b.session_id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::SessionNotFound));
    assert_eq!(h.store.session_count().await, 1);
}

#[tokio::test]
async fn test_revoke_user_and_tenant() {
    let h = harness();
    let a = h.tenant("tenant-a", json!({})).await;
    let b = h.tenant("tenant-b", json!({})).await;

    let alice = h.register(Some(a.id), "alice@x.com").await.unwrap();
    h.login(Some(a.id), "alice@x.com", PASSWORD).await.unwrap();
    h.register(Some(a.id), "bob@x.com").await.unwrap();
    h.register(Some(b.id), "carol@x.com").await.unwrap();

    let count = h
        .services
        .revocation
        .revoke_user(a.id, alice.user.id, None)
        .await
        .unwrap();
    assert_eq!(count, 2);
    assert_eq!(h.store.session_count().await, 2);

    let count = h.services.revocation.revoke_tenant(a.id, None).await.unwrap();
    assert_eq!(count, 1);

    let remaining = h.store.all_sessions().await;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].tenant_id, b.id);
}

#[tokio::test]
async fn test_role_change_respects_tenant_policy() {
    let h = harness();
    let lenient = h.tenant("lenient", json!({})).await;
    let strict = h
        .tenant(
            "strict",
            session_settings(json!({ "forceLogoutOnRoleChange": true })),
        )
        .await;

    let kept = h.register(Some(lenient.id), "a@x.com").await.unwrap();
    let outcome = h
        .services
        .revocation
        .on_role_change(lenient.id, kept.user.id, None)
        .await
        .unwrap();
    assert!(matches!(outcome, RoleChangeOutcome::Skipped { .. }));
    assert_eq!(h.store.session_count().await, 1);

    let dropped = h.register(Some(strict.id), "b@x.com").await.unwrap();
    h.events.clear();
    let outcome = h
        .services
        .revocation
        .change_role(strict.id, dropped.user.id, UserRole::Admin, None)
        .await
        .unwrap();
    assert_eq!(outcome, RoleChangeOutcome::Revoked { count: 1 });
    assert_eq!(
        h.events.names(),
        vec!["user.role_changed", "session.revoked"]
    );
    match &h.events.session_events()[0] {
        SessionEvent::Revoked { reason, .. } => assert_eq!(*reason, RevocationReason::RoleChange),
        other => panic!("unexpected event {other:?}"),
    }

    // The new role is what the gate reports from now on.
    let relogin = h.login(Some(strict.id), "b@x.com", PASSWORD).await.unwrap();
    let principal = h
        .services
        .gate
        .authenticate(&relogin.access_token)
        .await
        .unwrap();
    assert_eq!(principal.role, UserRole::Admin);
}

#[tokio::test]
async fn test_change_role_to_same_role_is_skipped() {
    let h = harness();
    let issued = h.register(None, "a@x.com").await.unwrap();
    h.events.clear();

    let outcome = h
        .services
        .revocation
        .change_role(issued.user.tenant_id, issued.user.id, UserRole::Member, None)
        .await
        .unwrap();
    assert!(matches!(outcome, RoleChangeOutcome::Skipped { .. }));
    assert!(h.events.events().is_empty());

    let missing = h
        .services
        .revocation
        .change_role(issued.user.tenant_id, Uuid::new_v4(), UserRole::Admin, None)
        .await;
    assert!(matches!(missing, Err(AuthError::Validation(_))));
}

#[tokio::test]
async fn test_federated_revocation_stays_in_tenant() {
    let h = harness();
    let a = h.tenant("tenant-a", json!({})).await;
    let b = h.tenant("tenant-b", json!({})).await;
    let in_b = h.register(Some(b.id), "fed@x.com").await.unwrap();

    let outcome = h
        .services
        .revocation
        .revoke_federated(&FederatedIdentity {
            tenant_id: a.id,
            user_id: None,
            email: Some("FED@x.com".to_string()),
        })
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        FederatedRevocationOutcome::IgnoredInvalid { .. }
    ));

    let outcome = h
        .services
        .revocation
        .revoke_federated(&FederatedIdentity {
            tenant_id: a.id,
            user_id: Some(in_b.user.id),
            email: None,
        })
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        FederatedRevocationOutcome::IgnoredInvalid { .. }
    ));
    assert_eq!(h.store.session_count().await, 1);

    let outcome = h
        .services
        .revocation
        .revoke_federated(&FederatedIdentity {
            tenant_id: b.id,
            user_id: None,
            email: Some("fed@x.com".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(
        outcome,
        FederatedRevocationOutcome::Revoked {
            user_id: in_b.user.id,
            count: 1,
        }
    );
    assert_eq!(h.store.session_count().await, 0);
}

#[tokio::test]
async fn test_federated_revocation_edge_cases() {
    let h = harness();
    let tenant = h.tenant("acme", json!({})).await;
    let user = h.register(Some(tenant.id), "a@x.com").await.unwrap().user;

    let outcome = h
        .services
        .revocation
        .revoke_federated(&FederatedIdentity {
            tenant_id: tenant.id,
            user_id: None,
            email: None,
        })
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        FederatedRevocationOutcome::IgnoredInvalid { .. }
    ));

    let outcome = h
        .services
        .revocation
        .revoke_federated(&FederatedIdentity {
            tenant_id: tenant.id,
            user_id: None,
            email: Some("nobody@x.com".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(outcome, FederatedRevocationOutcome::UserNotFound);

    // A user with no sessions still yields a federated revocation event.
    h.services
        .revocation
        .revoke_user(tenant.id, user.id, None)
        .await
        .unwrap();
    h.events.clear();
    let outcome = h
        .services
        .revocation
        .revoke_federated(&FederatedIdentity {
            tenant_id: tenant.id,
            user_id: Some(user.id),
            email: None,
        })
        .await
        .unwrap();
    assert_eq!(
        outcome,
        FederatedRevocationOutcome::Revoked {
            user_id: user.id,
            count: 0,
        }
    );
    match h.events.session_events().as_slice() {
        [SessionEvent::Revoked {
            session_ids,
            reason: RevocationReason::Federated,
            ..
        }] => assert!(session_ids.is_empty()),
        other => panic!("unexpected events {other:?}"),
    }
}

#[tokio::test]
async fn test_suspending_tenant_deletes_its_sessions() {
    let h = harness();
    let a = h.tenant("tenant-a", json!({})).await;
    let b = h.tenant("tenant-b", json!({})).await;
    let in_a = h.register(Some(a.id), "a@x.com").await.unwrap();
    h.register(Some(b.id), "b@x.com").await.unwrap();

    let revoked = h.services.tenants.suspend(a.id).await.unwrap();
    assert_eq!(revoked, vec![in_a.session_id]);
    assert_eq!(h.store.session_count().await, 1);

    let login = h.login(Some(a.id), "a@x.com", PASSWORD).await;
    assert!(matches!(login, Err(AuthError::TenantInactive { .. })));
}
