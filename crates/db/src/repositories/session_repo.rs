//! Repository for the `sessions` table.

use sqlx::{PgPool, Postgres, Transaction};

use gatekeep_core::types::DbId;

use crate::models::session::{CreateSession, Session};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, principal_id, refresh_token_hash, expires_at, revoked_at, \
                        user_agent, ip_address, last_activity_at, created_at";

/// Provides CRUD and rotation operations for sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateSession) -> Result<Session, sqlx::Error> {
        let query = format!(
            "INSERT INTO sessions (principal_id, refresh_token_hash, expires_at, user_agent, ip_address)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(input.principal_id)
            .bind(&input.refresh_token_hash)
            .bind(input.expires_at)
            .bind(&input.user_agent)
            .bind(&input.ip_address)
            .fetch_one(pool)
            .await
    }

    /// Find a session by ID, revoked or not.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Session>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sessions WHERE id = $1");
        sqlx::query_as::<_, Session>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an active session by its refresh token hash.
    ///
    /// Only returns sessions that are not revoked and not expired.
    pub async fn find_active_by_token_hash(
        pool: &PgPool,
        hash: &str,
    ) -> Result<Option<Session>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions
             WHERE refresh_token_hash = $1
               AND revoked_at IS NULL
               AND expires_at > NOW()"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(hash)
            .fetch_optional(pool)
            .await
    }

    /// List all sessions belonging to a principal, newest first.
    pub async fn list_for_principal(
        pool: &PgPool,
        principal_id: DbId,
    ) -> Result<Vec<Session>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions
             WHERE principal_id = $1
             ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(principal_id)
            .fetch_all(pool)
            .await
    }

    /// Revoke a single session. Returns `true` if this call performed the
    /// revocation, `false` if the session was already revoked or unknown.
    pub async fn revoke(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sessions SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke all active sessions for a principal in a single UPDATE.
    ///
    /// Returns the count of sessions revoked. No partially revoked state is
    /// observable: a concurrent refresh either rotates before this statement
    /// commits or observes its session as revoked.
    ///
    /// Isolation assumption (read committed): a [`Self::rotate`] transaction
    /// that commits after this statement takes its snapshot leaves the
    /// successor row untouched, so that one session can survive the sweep.
    /// Revoke-all is a sweep of sessions that exist at its snapshot, not a
    /// fence against in-flight rotations; callers needing a hard fence must
    /// serialize on the principal row first.
    pub async fn revoke_all_for_principal(
        pool: &PgPool,
        principal_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sessions SET revoked_at = NOW()
             WHERE principal_id = $1 AND revoked_at IS NULL",
        )
        .bind(principal_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Rotate a session: revoke the old row and create its replacement in
    /// one transaction.
    ///
    /// The revoke is conditional on the row still being active, so of two
    /// concurrent refresh calls presenting the same token exactly one gets
    /// the new session; the loser receives `Ok(None)` and must treat the
    /// token as revoked. No state is visible where both the old and new
    /// refresh tokens are simultaneously valid.
    pub async fn rotate(
        pool: &PgPool,
        old_session_id: DbId,
        input: &CreateSession,
    ) -> Result<Option<Session>, sqlx::Error> {
        let mut tx: Transaction<'_, Postgres> = pool.begin().await?;

        let revoked = sqlx::query(
            "UPDATE sessions SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(old_session_id)
        .execute(&mut *tx)
        .await?;

        if revoked.rows_affected() == 0 {
            // Lost the race: another call already rotated this session.
            tracing::debug!(session_id = old_session_id, "Rotation lost to a concurrent refresh");
            tx.rollback().await?;
            return Ok(None);
        }

        let query = format!(
            "INSERT INTO sessions (principal_id, refresh_token_hash, expires_at, user_agent, ip_address)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        let session = sqlx::query_as::<_, Session>(&query)
            .bind(input.principal_id)
            .bind(&input.refresh_token_hash)
            .bind(input.expires_at)
            .bind(&input.user_agent)
            .bind(&input.ip_address)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(session))
    }

    /// Bump `last_activity_at` to now.
    pub async fn touch_activity(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE sessions SET last_activity_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
