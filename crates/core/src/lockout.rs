//! Failed-login throttling and account lockout policy.
//!
//! Pure decision functions with no I/O. The caller reads the principal's
//! current failure state, asks this module what the new state should be,
//! and persists the result in a single atomic update.
//!
//! Counting uses a sliding window: failures only accumulate while they land
//! inside `window` of the first failure. A window that has elapsed is
//! treated as reset even if the stored counter was never physically zeroed.
//! Likewise, an expired lock never blocks a login; it is cleared lazily on
//! the next attempt rather than by a background sweep.

use chrono::Duration;

use crate::types::Timestamp;

/// Configured thresholds for failed-login handling.
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    /// Sliding window within which consecutive failures are counted.
    pub window: Duration,
    /// Number of failures inside one window that triggers a lock.
    pub max_failures: i32,
    /// How long a triggered lock lasts.
    pub lock_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            window: Duration::minutes(15),
            max_failures: 5,
            lock_duration: Duration::minutes(30),
        }
    }
}

/// The new failure state a caller must persist after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginAttemptOutcome {
    /// `false` once this failure triggered a lock; further attempts must be
    /// rejected until `locked_until` passes.
    pub allow: bool,
    /// New value for the failed-login counter.
    pub failure_count: i32,
    /// New window start. Reset to `now` when the previous window elapsed.
    pub window_start: Timestamp,
    /// Set when this failure reached `max_failures` within the window.
    pub locked_until: Option<Timestamp>,
}

/// Whether a stored `locked_until` timestamp still blocks authentication.
///
/// A lock in the past is simply stale state and must not block anything.
pub fn is_locked(locked_until: Option<Timestamp>, now: Timestamp) -> bool {
    matches!(locked_until, Some(until) if until > now)
}

/// Compute the failure state following one more failed login attempt.
///
/// If no window is open, or the open window started `policy.window` or more
/// ago, this failure opens a fresh window with a count of 1. Otherwise the
/// existing count is incremented. Reaching `policy.max_failures` sets
/// `locked_until = now + policy.lock_duration`.
pub fn record_failure(
    policy: &LockoutPolicy,
    failure_count: i32,
    window_start: Option<Timestamp>,
    now: Timestamp,
) -> LoginAttemptOutcome {
    let fresh_window = match window_start {
        None => true,
        Some(start) => now - start >= policy.window,
    };

    let new_count = if fresh_window { 1 } else { failure_count + 1 };

    let locked_until = if new_count >= policy.max_failures {
        Some(now + policy.lock_duration)
    } else {
        None
    };

    LoginAttemptOutcome {
        allow: locked_until.is_none(),
        failure_count: new_count,
        window_start: if fresh_window {
            now
        } else {
            window_start.unwrap_or(now)
        },
        locked_until,
    }
}
