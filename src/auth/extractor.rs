use axum::RequestPartsExt;
use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use uuid::Uuid;

use crate::auth::jwt;
use crate::error::AppError;
use crate::models::Role;
use crate::state::SharedState;

/// Caller identity resolved from the bearer token, attached to the request
/// for downstream handlers. A missing or malformed header rejects with 401;
/// a token that fails verification (bad signature or expired) rejects
/// with 403.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    /// Endpoints restricted to a fixed role set, e.g. user listing.
    pub fn require_role(&self, allowed: &[Role]) -> Result<(), AppError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Forbidden("Forbidden".to_string()))
        }
    }

    /// Strict self-access with no role override.
    pub fn require_self(&self, target: Uuid) -> Result<(), AppError> {
        if self.user_id == target {
            Ok(())
        } else {
            Err(AppError::Forbidden("Forbidden".to_string()))
        }
    }

    /// Self-access, or an admin acting on someone else's record.
    pub fn require_self_or_admin(&self, target: Uuid) -> Result<(), AppError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Manager | Role::Coworker => self.require_self(target),
        }
    }

    /// Whether the caller may read or write attendance on behalf of others.
    pub fn can_act_for_others(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Manager)
    }
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Unauthorized("No token provided".to_string()))?;

        let claims = jwt::decode_token(bearer.token(), &state.config.jwt_secret).map_err(|_| {
            tracing::warn!("Invalid token");
            AppError::Forbidden("Invalid token".to_string())
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

/// Endpoints that are open but behave differently for authenticated
/// callers, e.g. registration. No header means anonymous; a header that
/// is present but does not verify is still rejected.
impl OptionalFromRequestParts<SharedState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Option<Self>, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(None);
        }
        <AuthUser as FromRequestParts<SharedState>>::from_request_parts(parts, state)
            .await
            .map(Some)
    }
}
