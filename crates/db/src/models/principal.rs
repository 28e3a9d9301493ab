//! Principal entity model and DTOs.

use serde::Deserialize;
use sqlx::FromRow;

use gatekeep_core::kinds::statuses;
use gatekeep_core::types::{DbId, Timestamp};

/// Full principal row from the `principals` table.
///
/// Contains the password hash -- NEVER serialize this to API responses.
#[derive(Debug, Clone, FromRow)]
pub struct Principal {
    pub id: DbId,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    /// Actor kind tag: `admin`, `customer`, `seller`, or `moderator`.
    pub kind: String,
    /// Account status: `pending`, `active`, or `suspended`.
    pub status: String,
    pub email_verified: bool,
    pub failed_login_count: i32,
    pub failed_window_start: Option<Timestamp>,
    pub locked_until: Option<Timestamp>,
    pub last_login_at: Option<Timestamp>,
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Principal {
    /// Whether the account may authenticate at all (status check only;
    /// lockout is evaluated separately against the current time).
    pub fn is_active(&self) -> bool {
        self.status == statuses::ACTIVE
    }
}

/// DTO for creating a new principal.
#[derive(Debug, Deserialize)]
pub struct CreatePrincipal {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub kind: String,
}
