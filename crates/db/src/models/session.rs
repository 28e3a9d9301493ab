//! Session entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;

use gatekeep_core::types::{DbId, Timestamp};

/// A session row from the `sessions` table.
///
/// One row per refresh-token lineage. Only the SHA-256 digest of the
/// refresh token is stored; the plaintext never touches the database.
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub id: DbId,
    pub principal_id: DbId,
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub last_activity_at: Timestamp,
    pub created_at: Timestamp,
}

impl Session {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

/// DTO for creating a new session.
pub struct CreateSession {
    pub principal_id: DbId,
    pub refresh_token_hash: String,
    pub expires_at: Timestamp,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// Safe session representation for API responses (no token hash).
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: DbId,
    pub created_at: Timestamp,
    pub last_activity_at: Timestamp,
    pub expires_at: Timestamp,
    pub revoked: bool,
    pub user_agent: Option<String>,
}

impl From<Session> for SessionSummary {
    fn from(s: Session) -> Self {
        SessionSummary {
            session_id: s.id,
            created_at: s.created_at,
            last_activity_at: s.last_activity_at,
            expires_at: s.expires_at,
            revoked: s.is_revoked(),
            user_agent: s.user_agent,
        }
    }
}
