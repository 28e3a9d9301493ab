//! Handlers for the `/auth` resource (login, refresh, logout).

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use gatekeep_core::audit::event_types;
use gatekeep_core::error::CoreError;
use gatekeep_core::lockout;
use gatekeep_core::types::{DbId, Timestamp};
use gatekeep_db::models::{CreateSession, Principal};
use gatekeep_db::repositories::{PrincipalRepo, SessionRepo};

use crate::audit::record_event;
use crate::auth::jwt::{self, RefreshTokenParts};
use crate::auth::password::verify_password;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthPrincipal;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Successful authentication response returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub principal_id: DbId,
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: Timestamp,
    pub refresh_expires_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Authenticate with email + password. Returns access and refresh tokens.
///
/// Unknown identifiers and wrong passwords produce the identical response;
/// nothing in the status, code, or message reveals whether the account
/// exists. The failed-login counter is updated under a row lock so
/// concurrent attempts cannot clobber each other.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let now = Utc::now();

    // 1. Find the principal by login email.
    let Some(principal) = PrincipalRepo::find_by_email(&state.pool, &input.email).await? else {
        record_event(
            &state.pool,
            None,
            event_types::LOGIN_FAILURE,
            Some(json!({ "reason": "unknown_identifier" })),
        )
        .await;
        return Err(CoreError::InvalidCredentials.into());
    };

    // 2. Check account status and email verification.
    if !principal.is_active() {
        record_event(
            &state.pool,
            Some(principal.id),
            event_types::LOGIN_FAILURE,
            Some(json!({ "reason": "account_not_active", "status": principal.status })),
        )
        .await;
        return Err(CoreError::AccountNotActive.into());
    }
    if state.config.auth.require_verified_email && !principal.email_verified {
        record_event(
            &state.pool,
            Some(principal.id),
            event_types::LOGIN_FAILURE,
            Some(json!({ "reason": "email_not_verified" })),
        )
        .await;
        return Err(CoreError::EmailNotVerified.into());
    }

    // 3. Check the lockout window. An expired lock does not block; it is
    //    cleared by the success path below.
    if lockout::is_locked(principal.locked_until, now) {
        record_event(
            &state.pool,
            Some(principal.id),
            event_types::LOGIN_FAILURE,
            Some(json!({ "reason": "locked" })),
        )
        .await;
        return Err(CoreError::AccountLocked.into());
    }

    // 4. Verify the password.
    let password_valid = verify_password(&input.password, &principal.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        return Err(handle_failed_attempt(&state, principal.id, now).await?);
    }

    // 5. On success: reset failure state, stamp last_login_at, create a
    //    session, and issue the token pair.
    PrincipalRepo::record_successful_login(&state.pool, principal.id).await?;

    let (access_token, access_expires_at, refresh) = issue_tokens(&state, &principal)?;
    let session_input = CreateSession {
        principal_id: principal.id,
        refresh_token_hash: refresh.token_hash.clone(),
        expires_at: refresh.expires_at,
        user_agent: user_agent_of(&headers),
        ip_address: None,
    };
    SessionRepo::create(&state.pool, &session_input).await?;

    record_event(&state.pool, Some(principal.id), event_types::LOGIN_SUCCESS, None).await;
    tracing::info!(principal_id = principal.id, kind = %principal.kind, "Login succeeded");

    Ok(Json(AuthResponse {
        principal_id: principal.id,
        access_token,
        refresh_token: refresh.token,
        access_expires_at,
        refresh_expires_at: refresh.expires_at,
    }))
}

/// POST /api/v1/auth/refresh
///
/// Exchange a valid refresh token for a rotated token pair. The presented
/// token is single-use: its session is revoked in the same transaction that
/// creates the replacement, so of two concurrent calls exactly one wins.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<AuthResponse>> {
    let now = Utc::now();

    // 1. Verify signature, expiry, issuer, and typ. No session lookup on failure.
    let claims = jwt::validate_refresh_token(&input.refresh_token, &state.config.jwt)?;

    // 2. Locate the active session matching the token digest.
    let token_hash = jwt::hash_refresh_token(&input.refresh_token);
    let Some(session) = SessionRepo::find_active_by_token_hash(&state.pool, &token_hash).await?
    else {
        return Err(handle_refresh_reuse(&state, claims.sub).await?);
    };

    // A well-signed token whose digest matches a session owned by someone
    // else can only be forged state; treat it like a replay.
    if session.principal_id != claims.sub {
        return Err(handle_refresh_reuse(&state, claims.sub).await?);
    }

    // 3. Re-check the principal: suspension or lockout after issuance must
    //    invalidate refresh even though the token itself still verifies.
    let Some(principal) = PrincipalRepo::find_by_id(&state.pool, session.principal_id).await?
    else {
        return Err(CoreError::SessionRevoked.into());
    };
    if !principal.is_active() {
        return Err(CoreError::AccountNotActive.into());
    }
    if lockout::is_locked(principal.locked_until, now) {
        return Err(CoreError::AccountLocked.into());
    }

    // 4. Rotate: revoke the old session and create its replacement in one
    //    transaction.
    SessionRepo::touch_activity(&state.pool, session.id).await?;

    let (access_token, access_expires_at, refresh) = issue_tokens(&state, &principal)?;
    let session_input = CreateSession {
        principal_id: principal.id,
        refresh_token_hash: refresh.token_hash.clone(),
        expires_at: refresh.expires_at,
        user_agent: user_agent_of(&headers),
        ip_address: None,
    };
    let Some(_new_session) = SessionRepo::rotate(&state.pool, session.id, &session_input).await?
    else {
        // Lost a rotation race after the lookup above.
        return Err(CoreError::SessionRevoked.into());
    };

    record_event(&state.pool, Some(principal.id), event_types::TOKEN_REFRESHED, None).await;
    tracing::debug!(principal_id = principal.id, "Refresh token rotated");

    Ok(Json(AuthResponse {
        principal_id: principal.id,
        access_token,
        refresh_token: refresh.token,
        access_expires_at,
        refresh_expires_at: refresh.expires_at,
    }))
}

/// POST /api/v1/auth/logout
///
/// Revoke all sessions for the authenticated principal. Returns 204.
pub async fn logout(
    State(state): State<AppState>,
    principal: AuthPrincipal,
) -> AppResult<StatusCode> {
    let revoked =
        SessionRepo::revoke_all_for_principal(&state.pool, principal.principal_id).await?;
    record_event(
        &state.pool,
        Some(principal.principal_id),
        event_types::LOGOUT,
        Some(json!({ "sessions_revoked": revoked })),
    )
    .await;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Persist one more failed attempt under a row lock and return the uniform
/// invalid-credentials error.
///
/// The lockout state must be durably updated even though the login call
/// itself fails, so repeated bad attempts are never silently dropped. The
/// response is identical whether or not this attempt triggered a lock.
async fn handle_failed_attempt(
    state: &AppState,
    principal_id: DbId,
    now: Timestamp,
) -> AppResult<AppError> {
    let mut tx = state.pool.begin().await?;

    // Re-read under FOR UPDATE: concurrent failures serialize here, so the
    // counter reflects every attempt.
    let Some(current) = PrincipalRepo::find_for_update(&mut tx, principal_id).await? else {
        tx.rollback().await?;
        return Ok(CoreError::InvalidCredentials.into());
    };

    let outcome = lockout::record_failure(
        &state.config.auth.lockout,
        current.failed_login_count,
        current.failed_window_start,
        now,
    );
    PrincipalRepo::apply_failed_login(&mut tx, principal_id, &outcome).await?;
    tx.commit().await?;

    record_event(
        &state.pool,
        Some(principal_id),
        event_types::LOGIN_FAILURE,
        Some(json!({ "reason": "wrong_password", "failure_count": outcome.failure_count })),
    )
    .await;

    if !outcome.allow {
        record_event(
            &state.pool,
            Some(principal_id),
            event_types::ACCOUNT_LOCKED,
            Some(json!({ "locked_until": outcome.locked_until })),
        )
        .await;
        tracing::warn!(principal_id, "Account locked after repeated failures");
    }

    Ok(CoreError::InvalidCredentials.into())
}

/// Handle a well-signed refresh token with no matching active session:
/// either it expired, never existed, or was already rotated and is being
/// replayed. Optionally contain the compromise by revoking every session
/// the claimed principal holds.
async fn handle_refresh_reuse(state: &AppState, principal_id: DbId) -> AppResult<AppError> {
    record_event(
        &state.pool,
        Some(principal_id),
        event_types::REFRESH_REUSE_DETECTED,
        None,
    )
    .await;
    tracing::warn!(principal_id, "Refresh token replay or unknown token");

    if state.config.auth.revoke_on_reuse {
        let revoked = SessionRepo::revoke_all_for_principal(&state.pool, principal_id).await?;
        record_event(
            &state.pool,
            Some(principal_id),
            event_types::SESSIONS_REVOKED_ALL,
            Some(json!({ "sessions_revoked": revoked, "cause": "refresh_reuse" })),
        )
        .await;
        tracing::warn!(
            principal_id,
            revoked,
            "Revoked all sessions after refresh token reuse"
        );
    }

    Ok(CoreError::SessionRevoked.into())
}

/// Generate the access token and refresh-token parts for a principal.
fn issue_tokens(
    state: &AppState,
    principal: &Principal,
) -> AppResult<(String, Timestamp, RefreshTokenParts)> {
    let (access_token, access_expires_at) =
        jwt::generate_access_token(principal.id, &principal.kind, &state.config.jwt)
            .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
    let refresh = jwt::generate_refresh_token(principal.id, &principal.kind, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;
    Ok((access_token, access_expires_at, refresh))
}

/// Extract the client's User-Agent header, if any.
fn user_agent_of(headers: &HeaderMap) -> Option<String> {
    headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
