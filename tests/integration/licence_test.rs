//! Integration tests for tenant seat accounting.

mod helpers;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use futures::future::join_all;
use tenantgate_auth::AuthError;
use tenantgate_core::error::ErrorKind;
use tenantgate_database::LicenceTypeStore;

use helpers::{StallOnceLicenceStore, TestApp};

#[tokio::test]
async fn test_five_seat_plan_fills_and_frees() {
    let app = TestApp::new();
    let team = app.create_plan("Team", 5).await;
    let reg = app.register_tenant("acme.io", Some(team.id)).await;
    let tenant = reg.tenant.id;
    assert_eq!(reg.licence.used_seats, 1);

    for expected in 2..=5 {
        let seat = app.ledger.reserve_seat(tenant).await.expect("seat");
        assert_eq!(seat.used_seats, expected);
        assert_eq!(seat.max_seats, 5);
    }

    let err = app.ledger.reserve_seat(tenant).await.unwrap_err();
    assert!(matches!(err, AuthError::LicenceSeatsExceeded));
    assert_eq!(app.used_seats(tenant).await, 5);

    assert_eq!(app.ledger.release_seat(tenant).await.expect("release"), 4);
    assert!(app.ledger.reserve_seat(tenant).await.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reservations_never_oversell() {
    let app = TestApp::new();
    let team = app.create_plan("Team", 5).await;
    let tenant = app.register_tenant("acme.io", Some(team.id)).await.tenant.id;

    let attempts = (0..20).map(|_| {
        let ledger = app.ledger.clone();
        tokio::spawn(async move { ledger.reserve_seat(tenant).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("task"))
        .collect();

    let granted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(granted, 4);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, AuthError::LicenceSeatsExceeded))
    );
    assert_eq!(app.used_seats(tenant).await, 5);
}

#[tokio::test]
async fn test_expired_licence_refuses_seats() {
    let app = TestApp::new();
    let team = app.create_plan("Team", 5).await;
    let tenant = app.register_tenant("acme.io", Some(team.id)).await.tenant.id;

    let long_ago = Utc::now() - Duration::days(30);
    app.ledger.renew_at(tenant, 1, long_ago).await.expect("renew");

    let err = app.ledger.reserve_seat(tenant).await.unwrap_err();
    assert!(matches!(err, AuthError::LicenceExpired));
    assert_eq!(app.used_seats(tenant).await, 1);

    app.ledger.renew(tenant, 30).await.expect("renew");
    assert!(app.ledger.reserve_seat(tenant).await.is_ok());
}

#[tokio::test]
async fn test_retried_reservation_consumes_one_seat() {
    let app = TestApp::new();
    let team = app.create_plan("Team", 5).await;
    let tenant = app.register_tenant("acme.io", Some(team.id)).await.tenant.id;

    let first = app.ledger.reserve_seat_once(tenant, "req-42").await.expect("seat");
    let retry = app.ledger.reserve_seat_once(tenant, "req-42").await.expect("seat");

    assert_eq!(first, retry);
    assert_eq!(app.used_seats(tenant).await, 2);
}

#[tokio::test(start_paused = true)]
async fn test_retry_after_timed_out_commit_consumes_one_seat() {
    let app = TestApp::new();
    let team = app.create_plan("Team", 5).await;
    let tenant = app.register_tenant("acme.io", Some(team.id)).await.tenant.id;

    let mut config = helpers::test_config();
    config.auth.store_timeout_ms = 50;
    let licences = Arc::new(StallOnceLicenceStore::new(
        app.store.clone(),
        StdDuration::from_secs(30),
    ));
    let stalled = TestApp::with_stores(config, app.store.clone(), app.store.clone(), licences);

    let err = stalled
        .ledger
        .reserve_seat_once(tenant, "req-7")
        .await
        .unwrap_err();
    assert!(err.is_retryable(), "{err:?}");
    assert_eq!(app.used_seats(tenant).await, 2);

    let retry = stalled
        .ledger
        .reserve_seat_once(tenant, "req-7")
        .await
        .expect("retry");
    assert_eq!(retry.used_seats, 2);
    assert_eq!(app.used_seats(tenant).await, 2);

    let next = stalled
        .ledger
        .reserve_seat_once(tenant, "req-8")
        .await
        .expect("new key");
    assert_eq!(next.used_seats, 3);
}

#[tokio::test]
async fn test_downgrade_below_usage_refused() {
    let app = TestApp::new();
    let team = app.create_plan("Team", 5).await;
    let tenant = app.register_tenant("acme.io", Some(team.id)).await.tenant.id;
    app.ledger.reserve_seat(tenant).await.expect("seat");

    let before = app.ledger.summary(tenant).await.expect("summary");
    assert_eq!(before.licence_type_name, "Team");

    let pair = app.create_plan("Pair", 2).await;
    let solo = app.create_plan("Solo", 1).await;

    let err = app
        .ledger
        .change_licence_type(tenant, solo.id, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::LicenceSeatsExceeded));

    let moved = app
        .ledger
        .change_licence_type(tenant, pair.id, 14)
        .await
        .expect("change plan");
    assert_eq!(moved.licence_type_id, pair.id);
    assert!(moved.expiry_date.is_some());

    let summary = app.ledger.summary(tenant).await.expect("summary");
    assert_eq!(summary.licence_type_name, "Pair");
    assert_eq!(summary.max_seats, 2);
    assert_eq!(summary.used_seats, 2);
}

#[tokio::test]
async fn test_plan_in_use_cannot_be_deleted() {
    let app = TestApp::new();
    let team = app.create_plan("Team", 5).await;
    app.register_tenant("acme.io", Some(team.id)).await;

    let licence_types: &dyn LicenceTypeStore = app.store.as_ref();
    let err = licence_types.delete(team.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let unused = app.create_plan("Unused", 3).await;
    assert!(licence_types.delete(unused.id).await.expect("delete"));
}

#[tokio::test]
async fn test_tenant_without_licence_is_reported() {
    let app = TestApp::new();
    let err = app
        .ledger
        .reserve_seat(tenantgate_core::types::TenantId::new(999))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::LicenceNotFound));
}
