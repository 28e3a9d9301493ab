//! HTTP-level integration tests for the authentication endpoints.
//!
//! Covers login (including enumeration resistance and account lockout),
//! refresh token rotation with replay detection, and logout.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, build_test_app_with, create_test_principal, login_principal,
    post_json, post_json_auth, short_lockout_policy, test_config,
};
use sqlx::PgPool;

use gatekeep_core::kinds::{statuses, PrincipalKind};
use gatekeep_db::repositories::{AuditEventRepo, PrincipalRepo, SessionRepo};

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

/// Successful login returns 200 with both tokens and their expiries.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_success(pool: PgPool) {
    let (principal, password) =
        create_test_principal(&pool, "login@test.com", PrincipalKind::Customer.as_str()).await;
    let app = build_test_app(pool);

    let json = login_principal(app, "login@test.com", &password).await;

    assert_eq!(json["principal_id"], principal.id);
    assert!(json["access_token"].is_string(), "response must contain access_token");
    assert!(json["refresh_token"].is_string(), "response must contain refresh_token");
    assert!(json["access_expires_at"].is_string(), "response must contain access_expires_at");
    assert!(json["refresh_expires_at"].is_string(), "response must contain refresh_expires_at");
}

/// Login with an incorrect password returns 401 INVALID_CREDENTIALS.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_wrong_password(pool: PgPool) {
    create_test_principal(&pool, "wrongpw@test.com", PrincipalKind::Customer.as_str()).await;
    let app = build_test_app(pool);

    let body = serde_json::json!({ "email": "wrongpw@test.com", "password": "incorrect" });
    let response = post_json(app, "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_CREDENTIALS");
}

/// Login with an unknown email is indistinguishable from a wrong password:
/// same 401 status, same code, same message.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_unknown_email_matches_wrong_password(pool: PgPool) {
    create_test_principal(&pool, "known@test.com", PrincipalKind::Customer.as_str()).await;

    let body = serde_json::json!({ "email": "ghost@test.com", "password": "whatever" });
    let ghost = post_json(build_test_app(pool.clone()), "/api/v1/auth/login", body).await;
    assert_eq!(ghost.status(), StatusCode::UNAUTHORIZED);
    let ghost_json = body_json(ghost).await;

    let body = serde_json::json!({ "email": "known@test.com", "password": "whatever" });
    let wrong = post_json(build_test_app(pool), "/api/v1/auth/login", body).await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    let wrong_json = body_json(wrong).await;

    assert_eq!(ghost_json, wrong_json, "the two failures must be indistinguishable");
}

/// Login to a suspended account returns 403 ACCOUNT_NOT_ACTIVE.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_suspended_account(pool: PgPool) {
    let (principal, password) =
        create_test_principal(&pool, "suspended@test.com", PrincipalKind::Seller.as_str()).await;
    PrincipalRepo::set_status(&pool, principal.id, statuses::SUSPENDED)
        .await
        .expect("suspension should succeed");

    let app = build_test_app(pool);
    let body = serde_json::json!({ "email": "suspended@test.com", "password": password });
    let response = post_json(app, "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "ACCOUNT_NOT_ACTIVE");
}

/// Login with an unverified email returns 403 when verification is required.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_unverified_email(pool: PgPool) {
    let (principal, password) =
        create_test_principal(&pool, "unverified@test.com", PrincipalKind::Customer.as_str())
            .await;
    // create_test_principal verifies the email; undo that for this case.
    sqlx::query("UPDATE principals SET email_verified = FALSE WHERE id = $1")
        .bind(principal.id)
        .execute(&pool)
        .await
        .expect("update should succeed");

    let app = build_test_app(pool);
    let body = serde_json::json!({ "email": "unverified@test.com", "password": password });
    let response = post_json(app, "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "EMAIL_NOT_VERIFIED");
}

// ---------------------------------------------------------------------------
// Account lockout
// ---------------------------------------------------------------------------

/// After max_failures wrong passwords the account locks, and the correct
/// password is rejected with 423 until the lock expires.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_account_lockout(pool: PgPool) {
    let (_principal, password) =
        create_test_principal(&pool, "lockme@test.com", PrincipalKind::Customer.as_str()).await;

    // Fail 5 times (the default threshold) with the wrong password.
    for _ in 0..5 {
        let app = build_test_app(pool.clone());
        let body = serde_json::json!({ "email": "lockme@test.com", "password": "wrong_pass" });
        let response = post_json(app, "/api/v1/auth/login", body).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    // Even the correct password is now rejected with 423.
    let app = build_test_app(pool);
    let body = serde_json::json!({ "email": "lockme@test.com", "password": password });
    let response = post_json(app, "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::LOCKED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "ACCOUNT_LOCKED");
}

/// The lock transition leaves an audit trail behind: per-attempt failures
/// plus one account_locked event.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_lockout_is_audited(pool: PgPool) {
    let (principal, _password) =
        create_test_principal(&pool, "audited@test.com", PrincipalKind::Customer.as_str()).await;

    for _ in 0..5 {
        let app = build_test_app(pool.clone());
        let body = serde_json::json!({ "email": "audited@test.com", "password": "wrong_pass" });
        post_json(app, "/api/v1/auth/login", body).await;
    }

    let events = AuditEventRepo::list_for_principal(&pool, principal.id, 50)
        .await
        .expect("audit listing should succeed");
    let failures = events.iter().filter(|e| e.event_type == "login_failure").count();
    let locks = events.iter().filter(|e| e.event_type == "account_locked").count();
    assert_eq!(failures, 5);
    assert_eq!(locks, 1);
}

/// A soft-deleted principal is invisible to login: same uniform 401 as an
/// account that never existed.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_login_soft_deleted_principal(pool: PgPool) {
    let (principal, password) =
        create_test_principal(&pool, "gone@test.com", PrincipalKind::Customer.as_str()).await;
    PrincipalRepo::soft_delete(&pool, principal.id)
        .await
        .expect("soft delete should succeed");

    let app = build_test_app(pool);
    let body = serde_json::json!({ "email": "gone@test.com", "password": password });
    let response = post_json(app, "/api/v1/auth/login", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_CREDENTIALS");
}

/// A lower configured threshold locks earlier.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_lockout_respects_configured_threshold(pool: PgPool) {
    let (_principal, _password) =
        create_test_principal(&pool, "lowbar@test.com", PrincipalKind::Customer.as_str()).await;

    let mut config = test_config();
    config.auth.lockout = short_lockout_policy();

    for _ in 0..3 {
        let app = build_test_app_with(pool.clone(), config.clone());
        let body = serde_json::json!({ "email": "lowbar@test.com", "password": "wrong_pass" });
        let response = post_json(app, "/api/v1/auth/login", body).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let app = build_test_app_with(pool, config);
    let body = serde_json::json!({ "email": "lowbar@test.com", "password": "wrong_pass" });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::LOCKED);
}

/// An expired lock no longer blocks, and a successful login clears the
/// failure state entirely.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_expired_lock_allows_login_and_resets_state(pool: PgPool) {
    let (principal, password) =
        create_test_principal(&pool, "unlock@test.com", PrincipalKind::Customer.as_str()).await;

    // Simulate a lock that expired a minute ago.
    sqlx::query(
        "UPDATE principals
         SET failed_login_count = 5,
             failed_window_start = NOW() - INTERVAL '20 minutes',
             locked_until = NOW() - INTERVAL '1 minute'
         WHERE id = $1",
    )
    .bind(principal.id)
    .execute(&pool)
    .await
    .expect("update should succeed");

    let app = build_test_app(pool.clone());
    let json = login_principal(app, "unlock@test.com", &password).await;
    assert_eq!(json["principal_id"], principal.id);

    let row = PrincipalRepo::find_by_id(&pool, principal.id)
        .await
        .expect("lookup should succeed")
        .expect("principal should exist");
    assert_eq!(row.failed_login_count, 0);
    assert!(row.failed_window_start.is_none());
    assert!(row.locked_until.is_none());
    assert!(row.last_login_at.is_some());
}

// ---------------------------------------------------------------------------
// Refresh and rotation
// ---------------------------------------------------------------------------

/// A valid refresh token returns a rotated pair; the new refresh token
/// differs from the presented one.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_token_refresh_rotates(pool: PgPool) {
    let (_principal, password) =
        create_test_principal(&pool, "refresher@test.com", PrincipalKind::Customer.as_str())
            .await;

    let login_json =
        login_principal(build_test_app(pool.clone()), "refresher@test.com", &password).await;
    let refresh_token = login_json["refresh_token"].as_str().unwrap();

    let body = serde_json::json!({ "refresh_token": refresh_token });
    let response = post_json(build_test_app(pool), "/api/v1/auth/refresh", body).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["access_token"].is_string());
    assert_ne!(
        json["refresh_token"].as_str().unwrap(),
        refresh_token,
        "refresh token must rotate on use"
    );
}

/// A rotated refresh token is single-use: presenting it a second time is
/// rejected, while the replacement from the first call still works.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_refresh_token_single_use(pool: PgPool) {
    let (_principal, password) =
        create_test_principal(&pool, "singleuse@test.com", PrincipalKind::Customer.as_str())
            .await;

    let login_json =
        login_principal(build_test_app(pool.clone()), "singleuse@test.com", &password).await;
    let first_token = login_json["refresh_token"].as_str().unwrap().to_string();

    // First use succeeds and yields a replacement.
    let body = serde_json::json!({ "refresh_token": first_token });
    let response = post_json(build_test_app(pool.clone()), "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = body_json(response).await;
    let second_token = rotated["refresh_token"].as_str().unwrap().to_string();

    // Replaying the first token fails.
    let body = serde_json::json!({ "refresh_token": first_token });
    let replay = post_json(build_test_app(pool.clone()), "/api/v1/auth/refresh", body).await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(replay).await;
    assert_eq!(json["code"], "SESSION_REVOKED");

    // The replacement is unaffected by the detected replay (default policy).
    let body = serde_json::json!({ "refresh_token": second_token });
    let response = post_json(build_test_app(pool), "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::OK);
}

/// With reuse hardening enabled, a replayed refresh token revokes every
/// session the principal holds, including the rotated replacement.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_refresh_reuse_revokes_all_when_hardened(pool: PgPool) {
    let (_principal, password) =
        create_test_principal(&pool, "hardened@test.com", PrincipalKind::Customer.as_str())
            .await;

    let mut config = test_config();
    config.auth.revoke_on_reuse = true;

    let login_json = login_principal(
        build_test_app_with(pool.clone(), config.clone()),
        "hardened@test.com",
        &password,
    )
    .await;
    let first_token = login_json["refresh_token"].as_str().unwrap().to_string();

    let body = serde_json::json!({ "refresh_token": first_token });
    let response = post_json(
        build_test_app_with(pool.clone(), config.clone()),
        "/api/v1/auth/refresh",
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = body_json(response).await;
    let second_token = rotated["refresh_token"].as_str().unwrap().to_string();

    // Replay the consumed token.
    let body = serde_json::json!({ "refresh_token": first_token });
    let replay = post_json(
        build_test_app_with(pool.clone(), config.clone()),
        "/api/v1/auth/refresh",
        body,
    )
    .await;
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);

    // The replacement was revoked along with everything else.
    let body = serde_json::json!({ "refresh_token": second_token });
    let response = post_json(build_test_app_with(pool, config), "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Two concurrent refresh calls presenting the same token: exactly one
/// succeeds and exactly one observes the session as revoked.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_concurrent_refresh_has_one_winner(pool: PgPool) {
    let (_principal, password) =
        create_test_principal(&pool, "racer@test.com", PrincipalKind::Customer.as_str()).await;

    let login_json =
        login_principal(build_test_app(pool.clone()), "racer@test.com", &password).await;
    let refresh_token = login_json["refresh_token"].as_str().unwrap().to_string();

    let body = serde_json::json!({ "refresh_token": refresh_token });
    let (a, b) = tokio::join!(
        post_json(build_test_app(pool.clone()), "/api/v1/auth/refresh", body.clone()),
        post_json(build_test_app(pool), "/api/v1/auth/refresh", body),
    );

    let statuses = [a.status(), b.status()];
    assert_eq!(
        statuses.iter().filter(|s| **s == StatusCode::OK).count(),
        1,
        "exactly one of the two racing calls must win, got {statuses:?}"
    );
    assert_eq!(
        statuses
            .iter()
            .filter(|s| **s == StatusCode::UNAUTHORIZED)
            .count(),
        1,
        "the losing call must observe the session as revoked, got {statuses:?}"
    );
}

/// Refreshing with a garbage token fails signature validation before any
/// session lookup happens.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_refresh_with_garbage_token(pool: PgPool) {
    let app = build_test_app(pool);

    let body = serde_json::json!({ "refresh_token": "not-a-real-token" });
    let response = post_json(app, "/api/v1/auth/refresh", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "TOKEN_INVALID");
}

/// An access token presented to the refresh endpoint is rejected by the
/// `typ` claim check even though its signature verifies.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_refresh_rejects_access_token(pool: PgPool) {
    let (_principal, password) =
        create_test_principal(&pool, "typcheck@test.com", PrincipalKind::Customer.as_str())
            .await;

    let login_json =
        login_principal(build_test_app(pool.clone()), "typcheck@test.com", &password).await;
    let access_token = login_json["access_token"].as_str().unwrap();

    let body = serde_json::json!({ "refresh_token": access_token });
    let response = post_json(build_test_app(pool), "/api/v1/auth/refresh", body).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "TOKEN_INVALID");
}

/// A refresh token survives its own rotation chain, but dies the moment the
/// principal is suspended.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_refresh_rejected_after_suspension(pool: PgPool) {
    let (principal, password) =
        create_test_principal(&pool, "latersusp@test.com", PrincipalKind::Customer.as_str())
            .await;

    let login_json =
        login_principal(build_test_app(pool.clone()), "latersusp@test.com", &password).await;
    let refresh_token = login_json["refresh_token"].as_str().unwrap().to_string();

    PrincipalRepo::set_status(&pool, principal.id, statuses::SUSPENDED)
        .await
        .expect("suspension should succeed");

    let body = serde_json::json!({ "refresh_token": refresh_token });
    let response = post_json(build_test_app(pool), "/api/v1/auth/refresh", body).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "ACCOUNT_NOT_ACTIVE");
}

// ---------------------------------------------------------------------------
// Logout
// ---------------------------------------------------------------------------

/// Logout returns 204 and revokes every session, so the refresh token from
/// login stops working.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_logout_revokes_sessions(pool: PgPool) {
    let (principal, password) =
        create_test_principal(&pool, "logout@test.com", PrincipalKind::Customer.as_str()).await;

    let login_json =
        login_principal(build_test_app(pool.clone()), "logout@test.com", &password).await;
    let access_token = login_json["access_token"].as_str().unwrap().to_string();
    let refresh_token = login_json["refresh_token"].as_str().unwrap().to_string();

    let response = post_json_auth(
        build_test_app(pool.clone()),
        "/api/v1/auth/logout",
        serde_json::json!({}),
        &access_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The refresh token now dangles.
    let body = serde_json::json!({ "refresh_token": refresh_token });
    let response = post_json(build_test_app(pool.clone()), "/api/v1/auth/refresh", body).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // No active session remains in the store.
    let sessions = SessionRepo::list_for_principal(&pool, principal.id)
        .await
        .expect("listing should succeed");
    assert!(sessions.iter().all(|s| s.revoked_at.is_some()));
}

/// Logout without a bearer token returns 401.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_logout_requires_auth(pool: PgPool) {
    let app = build_test_app(pool);
    let response = post_json(app, "/api/v1/auth/logout", serde_json::json!({})).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
