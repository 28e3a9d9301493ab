//! Repository for the `principals` table.

use sqlx::{PgPool, Postgres, Transaction};

use gatekeep_core::lockout::LoginAttemptOutcome;
use gatekeep_core::types::DbId;

use crate::models::principal::{CreatePrincipal, Principal};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, email, username, password_hash, kind, status, email_verified, \
                        failed_login_count, failed_window_start, locked_until, last_login_at, \
                        deleted_at, created_at, updated_at";

/// Provides CRUD and credential-state operations for principals.
///
/// Every lookup excludes soft-deleted rows.
pub struct PrincipalRepo;

impl PrincipalRepo {
    /// Insert a new principal, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreatePrincipal) -> Result<Principal, sqlx::Error> {
        let query = format!(
            "INSERT INTO principals (email, username, password_hash, kind)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Principal>(&query)
            .bind(&input.email)
            .bind(&input.username)
            .bind(&input.password_hash)
            .bind(&input.kind)
            .fetch_one(pool)
            .await
    }

    /// Find a principal by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Principal>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM principals WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Principal>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a principal by login email (case-sensitive).
    pub async fn find_by_email(
        pool: &PgPool,
        email: &str,
    ) -> Result<Option<Principal>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM principals WHERE email = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Principal>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Re-read a principal row inside a transaction, taking a row lock.
    ///
    /// Concurrent failed-login attempts for the same principal serialize on
    /// this lock, so the failure counter is never updated from a stale read.
    pub async fn find_for_update(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<Option<Principal>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM principals
             WHERE id = $1 AND deleted_at IS NULL
             FOR UPDATE"
        );
        sqlx::query_as::<_, Principal>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Persist the outcome of a failed login attempt in a single UPDATE.
    ///
    /// Must run in the same transaction as the [`Self::find_for_update`]
    /// read that produced the outcome.
    pub async fn apply_failed_login(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        outcome: &LoginAttemptOutcome,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE principals SET
                failed_login_count = $2,
                failed_window_start = $3,
                locked_until = $4,
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(outcome.failure_count)
        .bind(outcome.window_start)
        .bind(outcome.locked_until)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Record a successful login: reset the failure counter and window,
    /// clear any (possibly stale) lock, and set `last_login_at`.
    pub async fn record_successful_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE principals SET
                failed_login_count = 0,
                failed_window_start = NULL,
                locked_until = NULL,
                last_login_at = NOW(),
                updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Change the account status. Returns `true` if the row was updated.
    pub async fn set_status(pool: &PgPool, id: DbId, status: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE principals SET status = $2, updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Mark the principal's email address as verified.
    pub async fn mark_email_verified(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE principals SET email_verified = true, updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Soft-delete a principal. The row survives for the audit trail but
    /// becomes invisible to every lookup. Returns `true` if updated.
    pub async fn soft_delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE principals SET deleted_at = NOW(), updated_at = NOW()
             WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
