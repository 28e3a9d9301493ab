//! Bearer-token authentication extractor for Axum handlers.
//!
//! This is the "current principal" interface the surrounding resource
//! endpoints consume: token verification is purely cryptographic, with no
//! database round trip.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use gatekeep_core::error::CoreError;
use gatekeep_core::types::DbId;

use crate::auth::jwt::validate_access_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated principal extracted from a JWT Bearer token in the
/// `Authorization` header.
///
/// Use this as an extractor parameter in any handler that requires
/// authentication:
///
/// ```ignore
/// async fn my_handler(principal: AuthPrincipal) -> AppResult<Json<()>> {
///     tracing::info!(principal_id = principal.principal_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthPrincipal {
    /// The principal's internal database id (from `claims.sub`).
    pub principal_id: DbId,
    /// The principal's kind tag (e.g. `"customer"`, `"admin"`).
    pub kind: String,
}

impl FromRequestParts<AppState> for AuthPrincipal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Core(CoreError::TokenInvalid))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::Core(CoreError::TokenInvalid))?;

        // Rejects refresh tokens outright via the typ claim.
        let claims = validate_access_token(token, &state.config.jwt)?;

        Ok(AuthPrincipal {
            principal_id: claims.sub,
            kind: claims.kind,
        })
    }
}
