//! Domain error taxonomy.
//!
//! Credential-stage failures carry deliberately uniform client-facing
//! messages: a caller must not be able to tell from the response whether an
//! identifier exists. The precise cause is recorded via tracing and the
//! audit trail instead.

use thiserror::Error;

use crate::types::DbId;

/// Domain-level error returned by the authentication, refresh, and
/// session-admin flows.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Wrong identifier or password. Also returned for nonexistent accounts
    /// (enumeration resistance).
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Account status is `pending` or `suspended`.
    #[error("Account is not active")]
    AccountNotActive,

    /// Email verification is required and has not been completed.
    #[error("Email address has not been verified")]
    EmailNotVerified,

    /// A lockout window is in effect. The remaining duration is not exposed.
    #[error("Account is temporarily locked. Try again later.")]
    AccountLocked,

    /// Signature or structural failure on an access or refresh token.
    #[error("Invalid token")]
    TokenInvalid,

    /// Token is structurally valid but past its expiry.
    #[error("Token has expired")]
    TokenExpired,

    /// Refresh token is well-signed but its session is revoked or unknown.
    /// Treated as a potential replay.
    #[error("Session has been revoked")]
    SessionRevoked,

    /// Authenticated principal acting on a session or resource it does not own.
    #[error("Forbidden")]
    Forbidden,

    /// Entity lookup failed.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Request payload failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Uniqueness or state conflict.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unexpected internal failure. The message is logged, never returned
    /// verbatim to the client.
    #[error("Internal error: {0}")]
    Internal(String),
}
