use chrono::Duration;

use gatekeep_core::lockout::LockoutPolicy;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have sensible defaults suitable for
/// local development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`). Bounds every auth
    /// call end-to-end; a timed-out call fails closed.
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry durations, issuer).
    pub jwt: JwtConfig,
    /// Authentication policy knobs (lockout thresholds, hardening flags).
    pub auth: AuthConfig,
}

/// Authentication policy configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Failed-login throttling thresholds.
    pub lockout: LockoutPolicy,
    /// Whether login requires a verified email address (default: `true`).
    pub require_verified_email: bool,
    /// Whether reuse of an already-rotated refresh token revokes every
    /// active session for the principal (default: `false`).
    pub revoke_on_reuse: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            lockout: LockoutPolicy::default(),
            require_verified_email: true,
            revoke_on_reuse: false,
        }
    }
}

impl AuthConfig {
    /// Load authentication policy from environment variables.
    ///
    /// | Env Var                     | Default |
    /// |-----------------------------|---------|
    /// | `LOCKOUT_WINDOW_MINS`       | `15`    |
    /// | `LOCKOUT_MAX_FAILURES`      | `5`     |
    /// | `LOCKOUT_DURATION_MINS`     | `30`    |
    /// | `REQUIRE_VERIFIED_EMAIL`    | `true`  |
    /// | `REVOKE_SESSIONS_ON_REUSE`  | `false` |
    pub fn from_env() -> Self {
        let window_mins: i64 = env_or("LOCKOUT_WINDOW_MINS", 15);
        let max_failures: i32 = env_or("LOCKOUT_MAX_FAILURES", 5);
        let lock_mins: i64 = env_or("LOCKOUT_DURATION_MINS", 30);

        Self {
            lockout: LockoutPolicy {
                window: Duration::minutes(window_mins),
                max_failures,
                lock_duration: Duration::minutes(lock_mins),
            },
            require_verified_email: env_flag("REQUIRE_VERIFIED_EMAIL", true),
            revoke_on_reuse: env_flag("REVOKE_SESSIONS_ON_REUSE", false),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", 30);

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt: JwtConfig::from_env(),
            auth: AuthConfig::from_env(),
        }
    }
}

/// Read an env var, falling back to `default` when unset.
///
/// # Panics
///
/// Panics when the variable is set but does not parse, which is the desired
/// behaviour -- misconfiguration should fail fast at startup.
fn env_or<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
    T::Err: std::fmt::Debug,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .unwrap_or_else(|e| panic!("{name} must be valid: {e:?}")),
        Err(_) => default,
    }
}

/// Read a boolean env var, falling back to `default` when unset.
///
/// # Panics
///
/// Panics when the variable is set to anything other than a recognized
/// boolean spelling, matching [`env_or`]: misconfiguration fails fast at
/// startup instead of silently coercing to `false`.
fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(raw) => parse_flag(name, &raw),
        Err(_) => default,
    }
}

/// Parse a boolean spelling (`true`/`false`, `1`/`0`, `yes`/`no`, any case).
fn parse_flag(name: &str, raw: &str) -> bool {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => true,
        "false" | "0" | "no" => false,
        other => panic!("{name} must be a boolean (true/false/1/0/yes/no), got '{other}'"),
    }
}
