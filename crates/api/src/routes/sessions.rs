//! Route definitions for session administration.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::sessions;
use crate::state::AppState;

/// Session-admin routes, keyed by owning principal.
///
/// ```text
/// GET    /principals/{id}/sessions                 -> list_sessions
/// DELETE /principals/{id}/sessions                 -> revoke_all_sessions
/// DELETE /principals/{id}/sessions/{session_id}    -> revoke_session
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/principals/{id}/sessions",
            get(sessions::list_sessions).delete(sessions::revoke_all_sessions),
        )
        .route(
            "/principals/{id}/sessions/{session_id}",
            delete(sessions::revoke_session),
        )
}
