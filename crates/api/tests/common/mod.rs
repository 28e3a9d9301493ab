//! Shared helpers for HTTP-level integration tests.

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use chrono::Duration;
use http_body_util::BodyExt;
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceExt;

use gatekeep_api::auth::jwt::JwtConfig;
use gatekeep_api::auth::password::{
    hash_password, validate_password_strength, MIN_PASSWORD_LENGTH,
};
use gatekeep_api::config::{AuthConfig, ServerConfig};
use gatekeep_api::router::build_app_router;
use gatekeep_api::state::AppState;
use gatekeep_core::kinds::statuses;
use gatekeep_core::lockout::LockoutPolicy;
use gatekeep_db::models::principal::{CreatePrincipal, Principal};
use gatekeep_db::repositories::PrincipalRepo;

/// Build a test `ServerConfig` with safe defaults and a fixed JWT secret.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 30,
            refresh_token_expiry_days: 7,
            issuer: "gatekeep".to_string(),
        },
        auth: AuthConfig::default(),
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool and the default test configuration.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

/// Build the application router with a caller-supplied configuration, for
/// tests that exercise non-default policy knobs (lockout thresholds,
/// reuse hardening).
pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// Create a login-ready principal directly in the database: active status,
/// verified email. Returns the row plus the plaintext password used.
pub async fn create_test_principal(
    pool: &PgPool,
    email: &str,
    kind: &str,
) -> (Principal, String) {
    let password = "test_password_123!";
    validate_password_strength(password, MIN_PASSWORD_LENGTH)
        .expect("seeded password should satisfy the strength policy");
    let hashed = hash_password(password).expect("hashing should succeed");
    let username = email.split('@').next().expect("email should contain @");
    let input = CreatePrincipal {
        email: email.to_string(),
        username: username.to_string(),
        password_hash: hashed,
        kind: kind.to_string(),
    };
    let principal = PrincipalRepo::create(pool, &input)
        .await
        .expect("principal creation should succeed");
    PrincipalRepo::set_status(pool, principal.id, statuses::ACTIVE)
        .await
        .expect("activation should succeed");
    PrincipalRepo::mark_email_verified(pool, principal.id)
        .await
        .expect("email verification should succeed");
    (principal, password.to_string())
}

/// Log in via the API and return the JSON response containing
/// `access_token`, `refresh_token`, and `principal_id`.
pub async fn login_principal(app: Router, email: &str, password: &str) -> serde_json::Value {
    let body = serde_json::json!({ "email": email, "password": password });
    let response = post_json(app, "/api/v1/auth/login", body).await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Send a GET request without authentication.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    app.oneshot(request).await.expect("request should complete")
}

/// Send a GET request with a bearer token.
pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request should build");
    app.oneshot(request).await.expect("request should complete")
}

/// Send a POST request with a JSON body, no authentication.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build");
    app.oneshot(request).await.expect("request should complete")
}

/// Send a POST request with a JSON body and a bearer token.
pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .expect("request should build");
    app.oneshot(request).await.expect("request should complete")
}

/// Send a DELETE request with a bearer token.
pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method("DELETE")
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request should build");
    app.oneshot(request).await.expect("request should complete")
}

/// Read a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be valid JSON")
}

/// A lockout policy small enough to trip within a test without waiting.
pub fn short_lockout_policy() -> LockoutPolicy {
    LockoutPolicy {
        window: Duration::minutes(15),
        max_failures: 3,
        lock_duration: Duration::minutes(30),
    }
}
