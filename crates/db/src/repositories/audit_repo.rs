//! Repository for the `audit_log` table.

use sqlx::PgPool;

use gatekeep_core::types::DbId;

use crate::models::audit::{AuditEvent, CreateAuditEvent};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, principal_id, event_type, detail, ip_address, created_at";

/// Provides insert and query operations for the append-only audit trail.
pub struct AuditEventRepo;

impl AuditEventRepo {
    /// Insert a single audit event, returning the created row.
    pub async fn insert(
        pool: &PgPool,
        input: &CreateAuditEvent,
    ) -> Result<AuditEvent, sqlx::Error> {
        let query = format!(
            "INSERT INTO audit_log (principal_id, event_type, detail, ip_address)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditEvent>(&query)
            .bind(input.principal_id)
            .bind(&input.event_type)
            .bind(&input.detail)
            .bind(&input.ip_address)
            .fetch_one(pool)
            .await
    }

    /// List events for a principal, newest first.
    pub async fn list_for_principal(
        pool: &PgPool,
        principal_id: DbId,
        limit: i64,
    ) -> Result<Vec<AuditEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_log
             WHERE principal_id = $1
             ORDER BY created_at DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, AuditEvent>(&query)
            .bind(principal_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}
