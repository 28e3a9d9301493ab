//! Handlers for session enumeration and revocation.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

use gatekeep_core::audit::event_types;
use gatekeep_core::error::CoreError;
use gatekeep_core::types::DbId;
use gatekeep_db::models::SessionSummary;
use gatekeep_db::repositories::SessionRepo;

use crate::audit::record_event;
use crate::error::AppResult;
use crate::middleware::auth::AuthPrincipal;
use crate::state::AppState;

/// GET /api/v1/principals/{id}/sessions
///
/// List all sessions (active and revoked) belonging to a principal.
/// A principal may only enumerate its own sessions.
pub async fn list_sessions(
    State(state): State<AppState>,
    principal: AuthPrincipal,
    Path(principal_id): Path<DbId>,
) -> AppResult<Json<Vec<SessionSummary>>> {
    require_owner(&principal, principal_id)?;

    let sessions = SessionRepo::list_for_principal(&state.pool, principal_id).await?;
    let summaries: Vec<SessionSummary> = sessions.into_iter().map(SessionSummary::from).collect();
    Ok(Json(summaries))
}

/// DELETE /api/v1/principals/{id}/sessions/{session_id}
///
/// Revoke a single session. Idempotent: revoking an already-revoked session
/// also returns 204. Returns 404 only for sessions that never existed;
/// sessions owned by another principal are a 403 regardless of state.
pub async fn revoke_session(
    State(state): State<AppState>,
    principal: AuthPrincipal,
    Path((principal_id, session_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    require_owner(&principal, principal_id)?;

    let Some(session) = SessionRepo::find_by_id(&state.pool, session_id).await? else {
        return Err(CoreError::NotFound {
            entity: "session",
            id: session_id,
        }
        .into());
    };
    if session.principal_id != principal_id {
        return Err(CoreError::Forbidden.into());
    }

    // `revoke` returns false when the session was already revoked; that is
    // still a success for the caller.
    let newly_revoked = SessionRepo::revoke(&state.pool, session_id).await?;
    if newly_revoked {
        record_event(
            &state.pool,
            Some(principal_id),
            event_types::SESSION_REVOKED,
            Some(json!({ "session_id": session_id })),
        )
        .await;
    }

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/principals/{id}/sessions
///
/// Revoke every active session for a principal in one atomic statement.
/// No concurrent refresh can observe a partially revoked set.
pub async fn revoke_all_sessions(
    State(state): State<AppState>,
    principal: AuthPrincipal,
    Path(principal_id): Path<DbId>,
) -> AppResult<StatusCode> {
    require_owner(&principal, principal_id)?;

    let revoked = SessionRepo::revoke_all_for_principal(&state.pool, principal_id).await?;
    record_event(
        &state.pool,
        Some(principal_id),
        event_types::SESSIONS_REVOKED_ALL,
        Some(json!({ "sessions_revoked": revoked })),
    )
    .await;

    Ok(StatusCode::NO_CONTENT)
}

/// Cross-principal session access is forbidden, full stop.
fn require_owner(principal: &AuthPrincipal, owner_id: DbId) -> Result<(), CoreError> {
    if principal.principal_id != owner_id {
        return Err(CoreError::Forbidden);
    }
    Ok(())
}
