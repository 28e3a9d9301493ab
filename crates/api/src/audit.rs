//! Best-effort audit event recording.
//!
//! Auth decisions never fail because the audit write failed; the failure is
//! logged and the request proceeds. The precise cause of a credential
//! failure lives only here and in tracing output, never in the client
//! response.

use gatekeep_core::types::DbId;
use gatekeep_db::models::CreateAuditEvent;
use gatekeep_db::repositories::AuditEventRepo;
use gatekeep_db::DbPool;

/// Record a security-relevant event for downstream audit tooling.
pub async fn record_event(
    pool: &DbPool,
    principal_id: Option<DbId>,
    event_type: &str,
    detail: Option<serde_json::Value>,
) {
    let input = CreateAuditEvent {
        principal_id,
        event_type: event_type.to_string(),
        detail,
        ip_address: None,
    };
    if let Err(e) = AuditEventRepo::insert(pool, &input).await {
        tracing::warn!(event_type, error = %e, "Failed to record audit event");
    }
}
