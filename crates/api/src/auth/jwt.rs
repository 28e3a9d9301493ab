//! Signed token generation and validation.
//!
//! Both token types are HS256-signed JWTs carrying the principal id and
//! kind. They are distinguished by the `typ` claim so one can never stand
//! in for the other: an access token is verifiable without any database
//! round trip, while a refresh token must additionally match the SHA-256
//! digest stored on its session row. Only the digest is persisted, so a
//! database leak does not compromise active sessions.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use gatekeep_core::error::CoreError;
use gatekeep_core::types::{DbId, Timestamp};

/// `typ` claim value for access tokens.
pub const TYP_ACCESS: &str = "access";
/// `typ` claim value for refresh tokens.
pub const TYP_REFRESH: &str = "refresh";

/// JWT claims embedded in every token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the principal's internal database id.
    pub sub: DbId,
    /// The principal's kind tag (e.g. `"customer"`, `"admin"`).
    pub kind: String,
    /// Token type: [`TYP_ACCESS`] or [`TYP_REFRESH`].
    pub typ: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4). Makes every refresh token, and
    /// therefore every stored digest, unique.
    pub jti: String,
    /// Issuer claim.
    pub iss: String,
}

/// Configuration for token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Access token lifetime in minutes (default: 30).
    pub access_token_expiry_mins: i64,
    /// Refresh token lifetime in days (default: 7).
    pub refresh_token_expiry_days: i64,
    /// Issuer claim required on every token (default: `gatekeep`).
    pub issuer: String,
}

/// Default access token expiry in minutes.
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 30;
/// Default refresh token expiry in days.
const DEFAULT_REFRESH_EXPIRY_DAYS: i64 = 7;
/// Default issuer claim.
const DEFAULT_ISSUER: &str = "gatekeep";

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                    | Required | Default    |
    /// |----------------------------|----------|------------|
    /// | `JWT_SECRET`               | **yes**  | --         |
    /// | `JWT_ACCESS_EXPIRY_MINS`   | no       | `30`       |
    /// | `JWT_REFRESH_EXPIRY_DAYS`  | no       | `7`        |
    /// | `JWT_ISSUER`               | no       | `gatekeep` |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");

        let refresh_token_expiry_days: i64 = std::env::var("JWT_REFRESH_EXPIRY_DAYS")
            .unwrap_or_else(|_| DEFAULT_REFRESH_EXPIRY_DAYS.to_string())
            .parse()
            .expect("JWT_REFRESH_EXPIRY_DAYS must be a valid i64");

        let issuer = std::env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string());

        Self {
            secret,
            access_token_expiry_mins,
            refresh_token_expiry_days,
            issuer,
        }
    }
}

/// A freshly generated refresh token: the signed plaintext sent to the
/// client, the digest to persist, and the expiry shared by both.
#[derive(Debug, Clone)]
pub struct RefreshTokenParts {
    pub token: String,
    pub token_hash: String,
    pub expires_at: Timestamp,
}

/// Generate an access token for the given principal.
///
/// Returns the signed token and its expiry instant.
pub fn generate_access_token(
    principal_id: DbId,
    kind: &str,
    config: &JwtConfig,
) -> Result<(String, Timestamp), jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let expires_at = now + chrono::Duration::minutes(config.access_token_expiry_mins);
    let token = sign(principal_id, kind, TYP_ACCESS, expires_at, config)?;
    Ok((token, expires_at))
}

/// Generate a refresh token for the given principal.
///
/// The plaintext goes to the client; only [`RefreshTokenParts::token_hash`]
/// may be persisted server-side.
pub fn generate_refresh_token(
    principal_id: DbId,
    kind: &str,
    config: &JwtConfig,
) -> Result<RefreshTokenParts, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let expires_at = now + chrono::Duration::days(config.refresh_token_expiry_days);
    let token = sign(principal_id, kind, TYP_REFRESH, expires_at, config)?;
    let token_hash = hash_refresh_token(&token);
    Ok(RefreshTokenParts {
        token,
        token_hash,
        expires_at,
    })
}

fn sign(
    principal_id: DbId,
    kind: &str,
    typ: &str,
    expires_at: Timestamp,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: principal_id,
        kind: kind.to_string(),
        typ: typ.to_string(),
        exp: expires_at.timestamp(),
        iat: chrono::Utc::now().timestamp(),
        jti: Uuid::new_v4().to_string(),
        iss: config.issuer.clone(),
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Validate an access token, returning the embedded [`Claims`].
///
/// Rejects refresh tokens presented as bearer tokens via the `typ` claim.
pub fn validate_access_token(token: &str, config: &JwtConfig) -> Result<Claims, CoreError> {
    validate(token, TYP_ACCESS, config)
}

/// Validate a refresh token's signature, expiry, issuer, and `typ` claim.
///
/// This performs no session lookup; a structurally valid refresh token must
/// still match an active session row before it is trusted.
pub fn validate_refresh_token(token: &str, config: &JwtConfig) -> Result<Claims, CoreError> {
    validate(token, TYP_REFRESH, config)
}

fn validate(token: &str, expected_typ: &str, config: &JwtConfig) -> Result<Claims, CoreError> {
    let mut validation = Validation::default(); // HS256, validates exp
    validation.set_issuer(&[&config.issuer]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(classify_jwt_error)?;

    if token_data.claims.typ != expected_typ {
        return Err(CoreError::TokenInvalid);
    }
    Ok(token_data.claims)
}

/// Map a jsonwebtoken failure onto the domain taxonomy: expiry is reported
/// distinctly, every other failure collapses into `TokenInvalid`.
fn classify_jwt_error(err: jsonwebtoken::errors::Error) -> CoreError {
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => CoreError::TokenExpired,
        _ => CoreError::TokenInvalid,
    }
}

/// Compute the SHA-256 hex digest of a refresh token.
///
/// Used to look an incoming refresh token up against the stored session
/// hash; the unique index on the digest makes the comparison exact without
/// handling the plaintext server-side.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
