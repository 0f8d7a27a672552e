//! End-to-end credential lifecycle over an in-process key-value store.

use std::sync::Arc;

use learnhub_auth::password::hash_password;
use learnhub_auth::{
    AuthConfig, AuthError, AuthState, CollectionUserStorage, CredentialKind, ManualClock,
    RotationPolicy, User, UserStorage, authorize_roles,
};
use learnhub_kv::MemoryKv;
use learnhub_storage::MemoryCollection;

struct Harness {
    state: AuthState,
    clock: Arc<ManualClock>,
    users: Arc<CollectionUserStorage>,
}

fn harness(rotation: RotationPolicy) -> Harness {
    let config = AuthConfig {
        access_token_secret: "access-secret".to_string(),
        refresh_token_secret: "refresh-secret".to_string(),
        rotation,
        ..AuthConfig::default()
    };
    let clock = Arc::new(ManualClock::starting_now());
    let users = Arc::new(CollectionUserStorage::new(Arc::new(MemoryCollection::new())));
    let state = AuthState::new(
        config,
        Arc::new(MemoryKv::new()),
        users.clone(),
        clock.clone(),
    );
    Harness {
        state,
        clock,
        users,
    }
}

async fn register(h: &Harness, id: &str, role: &str) -> User {
    let user = User::builder("Ada", format!("{id}@example.com"))
        .id(id)
        .role(role)
        .password_hash(hash_password("secret").unwrap())
        .build();
    h.users.create(user).await.unwrap()
}

#[tokio::test]
async fn login_then_gate_yields_same_subject() {
    let h = harness(RotationPolicy::Permissive);
    let user = register(&h, "u1", "user").await;

    let issued = h.state.sessions.establish(&user).await.unwrap();
    let identity = h
        .state
        .gate
        .authenticate(Some(issued.credentials.access.token().to_string()))
        .await
        .unwrap();

    assert_eq!(identity.subject_id, "u1");
    assert_eq!(identity.role, "user");
}

#[tokio::test]
async fn user_role_forbidden_on_admin_route() {
    let h = harness(RotationPolicy::Permissive);
    let user = register(&h, "u1", "user").await;
    let issued = h.state.sessions.establish(&user).await.unwrap();

    let identity = h
        .state
        .gate
        .authenticate(Some(issued.credentials.access.into_token()))
        .await
        .unwrap();

    assert!(matches!(
        authorize_roles(&identity, &["admin"]),
        Err(AuthError::Forbidden { role }) if role == "user"
    ));
}

#[tokio::test]
async fn refresh_does_not_revoke_under_permissive_policy() {
    let h = harness(RotationPolicy::Permissive);
    let user = register(&h, "u1", "user").await;
    let login = h.state.sessions.establish(&user).await.unwrap();

    let rotated = h
        .state
        .refresher
        .refresh(login.credentials.refresh.token())
        .await
        .unwrap();

    // Previous access credential still verifies and still passes the gate.
    assert_eq!(
        h.state
            .issuer
            .verify(login.credentials.access.token(), CredentialKind::Access)
            .unwrap(),
        "u1"
    );
    assert!(
        h.state
            .gate
            .authenticate(Some(login.credentials.access.token().to_string()))
            .await
            .is_ok()
    );

    // Both refresh credentials stay independently usable.
    assert!(
        h.state
            .refresher
            .refresh(login.credentials.refresh.token())
            .await
            .is_ok()
    );
    assert!(
        h.state
            .refresher
            .refresh(rotated.credentials.refresh.token())
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn strict_policy_revokes_previous_generation() {
    let h = harness(RotationPolicy::Strict);
    let user = register(&h, "u1", "user").await;
    let login = h.state.sessions.establish(&user).await.unwrap();

    let rotated = h
        .state
        .refresher
        .refresh(login.credentials.refresh.token())
        .await
        .unwrap();

    // TokenIssuer itself is unaffected by the policy.
    assert!(
        h.state
            .issuer
            .verify(login.credentials.access.token(), CredentialKind::Access)
            .is_ok()
    );
    assert!(matches!(
        h.state
            .gate
            .authenticate(Some(login.credentials.access.token().to_string()))
            .await,
        Err(AuthError::InvalidOrExpiredCredential { .. })
    ));
    assert!(matches!(
        h.state
            .refresher
            .refresh(login.credentials.refresh.token())
            .await,
        Err(AuthError::InvalidRefreshCredential { .. })
    ));
    assert!(
        h.state
            .gate
            .authenticate(Some(rotated.credentials.access.into_token()))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn expired_access_rejected_regardless_of_session() {
    let h = harness(RotationPolicy::Permissive);
    let user = register(&h, "u1", "user").await;
    let login = h.state.sessions.establish(&user).await.unwrap();

    h.clock.advance(time::Duration::minutes(5));

    assert!(h.state.sessions.store().get("u1").await.unwrap().is_some());
    assert!(matches!(
        h.state
            .gate
            .authenticate(Some(login.credentials.access.into_token()))
            .await,
        Err(AuthError::InvalidOrExpiredCredential { .. })
    ));
}

#[tokio::test]
async fn expired_access_recovered_by_refresh() {
    let h = harness(RotationPolicy::Permissive);
    let user = register(&h, "u1", "user").await;
    let login = h.state.sessions.establish(&user).await.unwrap();

    h.clock.advance(time::Duration::minutes(10));
    let rotated = h
        .state
        .refresher
        .refresh(login.credentials.refresh.token())
        .await
        .unwrap();

    let identity = h
        .state
        .gate
        .authenticate(Some(rotated.credentials.access.into_token()))
        .await
        .unwrap();
    assert_eq!(identity.subject_id, "u1");
}

#[tokio::test]
async fn logout_leaves_valid_credential_without_session() {
    let h = harness(RotationPolicy::Permissive);
    let user = register(&h, "u1", "user").await;
    let login = h.state.sessions.establish(&user).await.unwrap();

    h.state.sessions.end("u1").await.unwrap();

    assert!(
        h.state
            .issuer
            .verify(login.credentials.access.token(), CredentialKind::Access)
            .is_ok()
    );
    assert!(matches!(
        h.state
            .gate
            .authenticate(Some(login.credentials.access.into_token()))
            .await,
        Err(AuthError::SessionNotFound)
    ));
    assert!(matches!(
        h.state
            .refresher
            .refresh(login.credentials.refresh.token())
            .await,
        Err(AuthError::SessionExpired)
    ));
}

#[tokio::test]
async fn role_change_visible_after_sync() {
    let h = harness(RotationPolicy::Permissive);
    let mut user = register(&h, "u1", "user").await;
    let login = h.state.sessions.establish(&user).await.unwrap();
    let token = login.credentials.access.into_token();

    user.role = "admin".to_string();
    let before = h.state.gate.authenticate(Some(token.clone())).await.unwrap();
    assert_eq!(before.role, "user");

    h.state.sessions.sync(&user).await.unwrap();
    let after = h.state.gate.authenticate(Some(token)).await.unwrap();
    assert!(after.is_admin());
}
