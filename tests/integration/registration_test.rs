//! Integration tests for tenant sign-up and user management.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use tenantgate_auth::AuthError;
use tenantgate_core::types::{LicenceTypeId, UserId};
use tenantgate_entity::licence::licence_type::FREE_LICENCE_TYPE;
use tenantgate_entity::user::UserRole;
use tenantgate_service::RegistrationError;

use helpers::{StallAfterCreateUserStore, TestApp, tenant_request, user_request};

#[tokio::test]
async fn test_register_tenant_on_free_plan() {
    let app = TestApp::new();
    let reg = app.register_tenant("acme.io", None).await;

    assert_eq!(reg.tenant.email, "contact@acme.io");
    assert!(reg.tenant.is_active);
    assert_eq!(reg.admin.role, UserRole::TenantAdmin);
    assert_eq!(reg.admin.tenant_id, reg.tenant.id);
    assert_ne!(reg.admin.password_hash, helpers::PASSWORD);

    assert_eq!(reg.licence.tenant_id, reg.tenant.id);
    assert_eq!(reg.licence.used_seats, 1);
    assert!(reg.licence.expiry_date.is_none());
    assert!(!reg.licence.licence_key.is_empty());

    let summary = app.ledger.summary(reg.tenant.id).await.expect("summary");
    assert_eq!(summary.licence_type_name, FREE_LICENCE_TYPE);
    assert_eq!(summary.max_seats, 1);
}

#[tokio::test]
async fn test_email_domain_taken_by_other_tenant() {
    let app = TestApp::new();
    app.register_tenant("acme.io", None).await;

    let mut req = tenant_request("acme.io", None);
    req.email = "billing@ACME.io".to_string();
    req.admin = user_request("owner@elsewhere.io");

    let err = app.registration.register_tenant(req).await.unwrap_err();
    assert!(matches!(err, RegistrationError::TenantAlreadyExists));
}

#[tokio::test]
async fn test_unknown_starting_plan_rejected() {
    let app = TestApp::new();
    let err = app
        .registration
        .register_tenant(tenant_request("acme.io", Some(LicenceTypeId::new(404))))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RegistrationError::Auth(AuthError::LicenceTypeNotFound)
    ));
}

#[tokio::test]
async fn test_invalid_request_rejected_before_any_write() {
    let app = TestApp::new();
    let mut req = tenant_request("acme.io", None);
    req.admin.password = "short".to_string();

    let err = app.registration.register_tenant(req).await.unwrap_err();
    assert!(matches!(err, RegistrationError::Invalid(_)));
    assert!(app.user("admin@acme.io").await.is_none());
}

#[tokio::test]
async fn test_free_plan_has_no_room_for_second_user() {
    let app = TestApp::new();
    let tenant = app.register_tenant("acme.io", None).await.tenant.id;

    let err = app
        .registration
        .register_user(tenant, user_request("second@acme.io"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RegistrationError::Auth(AuthError::LicenceSeatsExceeded)
    ));
    assert!(app.user("second@acme.io").await.is_none());
    assert_eq!(app.used_seats(tenant).await, 1);
}

#[tokio::test]
async fn test_duplicate_user_email_keeps_seat_count() {
    let app = TestApp::new();
    let team = app.create_plan("Team", 5).await;
    let tenant = app.register_tenant("acme.io", Some(team.id)).await.tenant.id;
    app.add_user(tenant, "dev@acme.io").await;

    let err = app
        .registration
        .register_user(tenant, user_request("DEV@acme.io"))
        .await
        .unwrap_err();

    assert!(matches!(err, RegistrationError::UserAlreadyExists));
    assert_eq!(app.used_seats(tenant).await, 2);
}

#[tokio::test]
async fn test_deleting_user_releases_seat() {
    let app = TestApp::new();
    let team = app.create_plan("Team", 2).await;
    let tenant = app.register_tenant("acme.io", Some(team.id)).await.tenant.id;

    let dev = app.add_user(tenant, "dev@acme.io").await;
    assert_eq!(dev.role, UserRole::TenantUser);
    assert_eq!(app.used_seats(tenant).await, 2);

    app.registration
        .delete_user(tenant, dev.id)
        .await
        .expect("delete user");
    assert_eq!(app.used_seats(tenant).await, 1);
    assert!(app.user("dev@acme.io").await.is_none());

    let err = app.registration.delete_user(tenant, dev.id).await.unwrap_err();
    assert!(matches!(err, RegistrationError::UserNotFound));
    assert_eq!(app.used_seats(tenant).await, 1);

    // The freed seat is usable again.
    app.add_user(tenant, "ops@acme.io").await;
    assert_eq!(app.used_seats(tenant).await, 2);
}

#[tokio::test]
async fn test_user_of_other_tenant_cannot_be_deleted() {
    let app = TestApp::new();
    let team = app.create_plan("Team", 3).await;
    let acme = app.register_tenant("acme.io", Some(team.id)).await.tenant.id;
    let globex = app.register_tenant("globex.io", Some(team.id)).await.tenant.id;
    let dev = app.add_user(acme, "dev@acme.io").await;

    let err = app.registration.delete_user(globex, dev.id).await.unwrap_err();
    assert!(matches!(err, RegistrationError::UserNotFound));
    assert_eq!(app.used_seats(acme).await, 2);
    assert_eq!(app.used_seats(globex).await, 1);

    let err = app
        .registration
        .delete_user(acme, UserId::new(9_999))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistrationError::UserNotFound));
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_user_insert_keeps_its_seat() {
    let app = TestApp::new();
    let duo = app.create_plan("Duo", 2).await;
    let tenant = app.register_tenant("acme.io", Some(duo.id)).await.tenant.id;

    let mut config = helpers::test_config();
    config.auth.store_timeout_ms = 50;
    let stalling = Arc::new(StallAfterCreateUserStore {
        inner: app.store.clone(),
        delay: Duration::from_secs(30),
    });
    let stalled = TestApp::with_user_store(config, app.store.clone(), stalling);

    let err = stalled
        .registration
        .register_user(tenant, user_request("dev@acme.io"))
        .await
        .unwrap_err();
    assert!(err.is_retryable(), "{err:?}");

    // The insert landed, so its seat must stay taken.
    assert!(app.user("dev@acme.io").await.is_some());
    assert_eq!(app.used_seats(tenant).await, 2);

    let err = app
        .registration
        .register_user(tenant, user_request("ops@acme.io"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RegistrationError::Auth(AuthError::LicenceSeatsExceeded)
    ));
    assert!(app.user("ops@acme.io").await.is_none());
}
