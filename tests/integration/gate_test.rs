//! Integration tests for request admission.

mod helpers;

use std::time::Duration;

use tenantgate_auth::{AuthError, Operation, RequestGate};
use tenantgate_core::error::ErrorKind;

use helpers::TestApp;

#[tokio::test]
async fn test_throttle_applies_before_token_checks() {
    let app = TestApp::new();
    let gate = app.gate(2, 0.001);

    for _ in 0..2 {
        let err = gate
            .admit("198.51.100.1", None, Operation::GetUsers, None)
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingBearer));
    }

    let err = gate
        .admit("198.51.100.1", None, Operation::GetUsers, None)
        .unwrap_err();
    assert!(matches!(err, AuthError::RateLimited));

    // Other clients keep their own budget.
    let err = gate
        .admit("198.51.100.2", None, Operation::GetUsers, None)
        .unwrap_err();
    assert!(matches!(err, AuthError::MissingBearer));
}

#[tokio::test]
async fn test_admin_token_admitted_for_permitted_operations() {
    let app = TestApp::new();
    let reg = app.register_tenant("acme.io", None).await;
    let token = app.login("admin@acme.io").await;
    let header = format!("Bearer {token}");
    let gate = app.gate(10, 5.0);

    let claims = gate
        .admit("client", Some(&header), Operation::GetUsers, None)
        .expect("admitted");
    assert_eq!(claims.tenant_id, reg.tenant.id);

    assert!(
        gate.admit("client", Some(&header), Operation::AddUser, None)
            .is_ok()
    );
    assert!(
        gate.admit(
            "client",
            Some(&header),
            Operation::UpdateUser,
            Some(reg.admin.id)
        )
        .is_ok()
    );
}

#[tokio::test]
async fn test_role_outside_table_is_forbidden() {
    let app = TestApp::new();
    app.register_tenant("acme.io", None).await;
    let header = format!("Bearer {}", app.login("admin@acme.io").await);
    let gate = app.gate(10, 5.0);

    for op in [
        Operation::DeleteUser,
        Operation::CreateLicenceType,
        Operation::GetLicenceTypes,
    ] {
        let err = gate.admit("client", Some(&header), op, None).unwrap_err();
        assert!(matches!(err, AuthError::Forbidden), "{op} should be forbidden");
    }
}

#[tokio::test]
async fn test_update_of_another_user_is_forbidden() {
    let app = TestApp::new();
    let team = app.create_plan("Team", 5).await;
    let tenant = app.register_tenant("acme.io", Some(team.id)).await.tenant.id;
    let dev = app.add_user(tenant, "dev@acme.io").await;
    let header = format!("Bearer {}", app.login("admin@acme.io").await);
    let gate = app.gate(10, 5.0);

    let err = gate
        .admit("client", Some(&header), Operation::UpdateUser, Some(dev.id))
        .unwrap_err();
    assert!(matches!(err, AuthError::Forbidden));
}

#[tokio::test]
async fn test_tenant_user_cannot_delete_self() {
    let app = TestApp::new();
    let team = app.create_plan("Team", 5).await;
    let tenant = app.register_tenant("acme.io", Some(team.id)).await.tenant.id;
    let dev = app.add_user(tenant, "dev@acme.io").await;
    let admin = app.user("admin@acme.io").await.expect("admin");
    let header = format!("Bearer {}", app.login("dev@acme.io").await);
    let gate = app.gate(10, 5.0);

    let err = gate
        .admit("client", Some(&header), Operation::DeleteUser, Some(dev.id))
        .unwrap_err();
    assert!(matches!(err, AuthError::Forbidden));

    assert!(
        gate.admit("client", Some(&header), Operation::DeleteUser, Some(admin.id))
            .is_ok()
    );
}

#[tokio::test]
async fn test_expired_and_tampered_tokens_rejected() {
    let app = TestApp::new();
    app.register_tenant("acme.io", None).await;
    let outcome = app
        .verifier
        .verify_login("admin@acme.io", helpers::PASSWORD, helpers::CLIENT_IP)
        .await
        .expect("login");
    let gate = app.gate(10, 5.0);
    let header = format!("bearer {}", outcome.token);

    assert!(
        gate.admit_at(
            "client",
            Some(&header),
            Operation::GetUsers,
            None,
            outcome.claims.issued_at
        )
        .is_ok()
    );

    let err = gate
        .admit_at(
            "client",
            Some(&header),
            Operation::GetUsers,
            None,
            outcome.claims.expires_at,
        )
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenExpired));

    let mut tampered = outcome.token.clone();
    tampered.push('x');
    let err = gate
        .admit(
            "client",
            Some(&format!("Bearer {tampered}")),
            Operation::GetUsers,
            None,
        )
        .unwrap_err();
    assert!(matches!(err, AuthError::SignatureInvalid));
}

#[tokio::test]
async fn test_non_bearer_schemes_rejected() {
    let app = TestApp::new();
    let gate = app.gate(10, 5.0);

    for header in ["Basic dXNlcjpwYXNz", "Bearer", "Bearer   ", "token-only"] {
        let err = gate
            .admit("client", Some(header), Operation::GetUsers, None)
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingBearer), "{header}");
    }
}

#[tokio::test]
async fn test_configured_overrides_change_the_rule_table() {
    let mut config = helpers::test_config();
    config
        .authorization
        .overrides
        .insert("delete-user".to_string(), vec!["tenant_admin".to_string()]);
    let app = TestApp::with_config(config);
    let team = app.create_plan("Team", 5).await;
    let tenant = app.register_tenant("acme.io", Some(team.id)).await.tenant.id;
    let dev = app.add_user(tenant, "dev@acme.io").await;
    let header = format!("Bearer {}", app.login("admin@acme.io").await);
    let gate = app.gate(10, 5.0);

    assert!(
        gate.admit("client", Some(&header), Operation::DeleteUser, Some(dev.id))
            .is_ok()
    );
    // Operations without an override keep their built-in rule.
    let err = gate
        .admit("client", Some(&header), Operation::CreateLicenceType, None)
        .unwrap_err();
    assert!(matches!(err, AuthError::Forbidden));
}

#[tokio::test]
async fn test_unknown_override_is_a_configuration_error() {
    let mut config = helpers::test_config();
    config
        .authorization
        .overrides
        .insert("drop-tables".to_string(), vec!["tenant_admin".to_string()]);
    let app = TestApp::with_config(config.clone());

    let err = RequestGate::from_config(&config, app.decoder.clone()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Configuration);
}

#[tokio::test(start_paused = true)]
async fn test_configured_gate_evicts_idle_buckets() {
    let mut config = helpers::test_config();
    config.rate_limit.idle_eviction_seconds = 2;
    let app = TestApp::with_config(config.clone());
    let gate = RequestGate::from_config(&config, app.decoder.clone()).expect("gate");
    assert!(gate.evicts_idle_buckets());

    let _ = gate.admit("198.51.100.9", None, Operation::GetUsers, None);
    assert_eq!(gate.limiter().tracked_keys(), 1);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(gate.limiter().tracked_keys(), 0);
}

#[tokio::test]
async fn test_zero_idle_window_disables_eviction() {
    let mut config = helpers::test_config();
    config.rate_limit.idle_eviction_seconds = 0;
    let app = TestApp::with_config(config.clone());
    let gate = RequestGate::from_config(&config, app.decoder.clone()).expect("gate");
    assert!(!gate.evicts_idle_buckets());
}
