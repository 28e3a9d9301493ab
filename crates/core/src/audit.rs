//! Audit event constants.
//!
//! This module lives in `core` (zero internal deps) so event names stay in
//! one place for both the API layer and downstream audit tooling.

/// Known event types for audit log entries.
pub mod event_types {
    pub const LOGIN_SUCCESS: &str = "login_success";
    pub const LOGIN_FAILURE: &str = "login_failure";
    pub const ACCOUNT_LOCKED: &str = "account_locked";
    pub const TOKEN_REFRESHED: &str = "token_refreshed";
    pub const REFRESH_REUSE_DETECTED: &str = "refresh_reuse_detected";
    pub const SESSION_REVOKED: &str = "session_revoked";
    pub const SESSIONS_REVOKED_ALL: &str = "sessions_revoked_all";
    pub const LOGOUT: &str = "logout";
}
