//! Integration tests for login verification and account lockout.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use tenantgate_auth::AuthError;
use tenantgate_core::error::ErrorKind;
use tenantgate_database::repositories::MemoryStore;
use tenantgate_entity::user::UserRole;

use helpers::{CLIENT_IP, PASSWORD, SlowUserStore, TestApp};

#[tokio::test]
async fn test_login_issues_token_for_registered_admin() {
    let app = TestApp::new();
    let reg = app.register_tenant("acme.io", None).await;

    let outcome = app
        .verifier
        .verify_login("admin@acme.io", PASSWORD, CLIENT_IP)
        .await
        .expect("login");

    assert_eq!(outcome.claims.subject_id, reg.admin.id.to_string());
    assert_eq!(outcome.claims.tenant_id, reg.tenant.id);
    assert_eq!(outcome.claims.role, UserRole::TenantAdmin);
    assert_eq!(
        outcome.claims.expires_at - outcome.claims.issued_at,
        ChronoDuration::hours(10)
    );

    let decoded = app.decoder.decode(&outcome.token).expect("decode");
    assert_eq!(decoded, outcome.claims);

    let admin = app.user("admin@acme.io").await.expect("admin");
    assert_eq!(admin.last_login_ip.as_deref(), Some(CLIENT_IP));
    assert!(admin.last_login_at.is_some());
}

#[tokio::test]
async fn test_email_lookup_is_case_insensitive() {
    let app = TestApp::new();
    app.register_tenant("acme.io", None).await;

    let outcome = app
        .verifier
        .verify_login("Admin@ACME.io", PASSWORD, CLIENT_IP)
        .await;
    assert!(outcome.is_ok());
}

#[tokio::test]
async fn test_unknown_email_and_wrong_password_look_the_same() {
    let app = TestApp::new();
    app.register_tenant("acme.io", None).await;

    let unknown = app
        .verifier
        .verify_login("nobody@acme.io", PASSWORD, CLIENT_IP)
        .await
        .unwrap_err();
    let wrong = app
        .verifier
        .verify_login("admin@acme.io", "not-the-password", CLIENT_IP)
        .await
        .unwrap_err();

    assert!(matches!(unknown, AuthError::InvalidCredentials));
    assert!(matches!(wrong, AuthError::InvalidCredentials));
    assert_eq!(unknown.to_string(), wrong.to_string());
}

#[tokio::test]
async fn test_account_locks_after_three_failures() {
    let app = TestApp::new();
    app.register_tenant("acme.io", None).await;

    for _ in 0..3 {
        let err = app
            .verifier
            .verify_login("admin@acme.io", "wrong-password", CLIENT_IP)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    let admin = app.user("admin@acme.io").await.expect("admin");
    assert!(admin.locked);
    assert_eq!(admin.failed_login_attempts, 3);

    // The right password no longer helps.
    let err = app
        .verifier
        .verify_login("admin@acme.io", PASSWORD, CLIENT_IP)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::AccountLocked));
}

#[tokio::test]
async fn test_success_resets_failure_counter() {
    let app = TestApp::new();
    app.register_tenant("acme.io", None).await;

    for _ in 0..2 {
        let _ = app
            .verifier
            .verify_login("admin@acme.io", "wrong-password", CLIENT_IP)
            .await;
    }
    app.login("admin@acme.io").await;
    for _ in 0..2 {
        let _ = app
            .verifier
            .verify_login("admin@acme.io", "wrong-password", CLIENT_IP)
            .await;
    }

    let admin = app.user("admin@acme.io").await.expect("admin");
    assert!(!admin.locked);
    assert_eq!(admin.failed_login_attempts, 2);
}

#[tokio::test]
async fn test_inactive_account_rejected_before_password_check() {
    let app = TestApp::new();
    let reg = app.register_tenant("acme.io", None).await;
    assert!(app.store.set_user_active(reg.admin.id, false).await);

    let err = app
        .verifier
        .verify_login("admin@acme.io", PASSWORD, CLIENT_IP)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::AccountInactive));

    let admin = app.user("admin@acme.io").await.expect("admin");
    assert_eq!(admin.failed_login_attempts, 0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_store_times_out_as_retryable() {
    let mut config = helpers::test_config();
    config.auth.store_timeout_ms = 50;

    let store = Arc::new(MemoryStore::new());
    let slow = Arc::new(SlowUserStore {
        inner: store.clone(),
        delay: Duration::from_secs(30),
    });
    let app = TestApp::with_user_store(config, store, slow);

    let err = app
        .verifier
        .verify_login("admin@acme.io", PASSWORD, CLIENT_IP)
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    match err {
        AuthError::Store(inner) => assert_eq!(inner.kind, ErrorKind::Timeout),
        other => panic!("expected a store timeout, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_guesses_stop_at_threshold() {
    let app = TestApp::new();
    app.register_tenant("acme.io", None).await;

    let tasks = (0..10).map(|i| {
        let verifier = app.verifier.clone();
        tokio::spawn(async move {
            verifier
                .verify_login("admin@acme.io", &format!("guess-{i}"), CLIENT_IP)
                .await
        })
    });
    let results: Vec<_> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task"))
        .collect();

    let invalid = results
        .iter()
        .filter(|r| matches!(r, Err(AuthError::InvalidCredentials)))
        .count();
    let locked = results
        .iter()
        .filter(|r| matches!(r, Err(AuthError::AccountLocked)))
        .count();
    assert_eq!(invalid, 3);
    assert_eq!(locked, 7);

    let admin = app.user("admin@acme.io").await.expect("admin");
    assert!(admin.locked);
    assert_eq!(admin.failed_login_attempts, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_correct_password_racing_lockout_never_outlives_lock() {
    let app = TestApp::new();
    app.register_tenant("acme.io", None).await;
    for _ in 0..2 {
        let _ = app
            .verifier
            .verify_login("admin@acme.io", "wrong", CLIENT_IP)
            .await;
    }

    let tasks = (0..6).map(|i| {
        let verifier = app.verifier.clone();
        let password = if i == 0 { PASSWORD.to_string() } else { format!("guess-{i}") };
        tokio::spawn(async move {
            verifier
                .verify_login("admin@acme.io", &password, CLIENT_IP)
                .await
        })
    });
    let results: Vec<_> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.expect("task"))
        .collect();

    let ok = results.iter().filter(|r| r.is_ok()).count();
    let invalid = results
        .iter()
        .filter(|r| matches!(r, Err(AuthError::InvalidCredentials)))
        .count();
    assert!(results.iter().all(|r| matches!(
        r,
        Ok(_) | Err(AuthError::InvalidCredentials) | Err(AuthError::AccountLocked)
    )));

    // Either the correct password won the race and reset the counter, or a
    // guess locked the account first and the correct password was refused.
    if ok == 1 {
        assert_eq!(invalid, 3);
    } else {
        assert_eq!(ok, 0);
        assert_eq!(invalid, 1);
    }

    let admin = app.user("admin@acme.io").await.expect("admin");
    assert!(admin.locked);
    assert_eq!(admin.failed_login_attempts, 3);
}
