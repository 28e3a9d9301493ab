//! Audit event entity model and DTO.
//!
//! Audit entries are immutable once created (no `updated_at`).

use serde::Serialize;
use sqlx::FromRow;

use gatekeep_core::types::{DbId, Timestamp};

/// A single audit log entry.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditEvent {
    pub id: DbId,
    pub principal_id: Option<DbId>,
    pub event_type: String,
    pub detail: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for inserting a new audit event.
#[derive(Debug, Clone)]
pub struct CreateAuditEvent {
    pub principal_id: Option<DbId>,
    pub event_type: String,
    pub detail: Option<serde_json::Value>,
    pub ip_address: Option<String>,
}
