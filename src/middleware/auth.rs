use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};

use sea_orm::EntityTrait;

use crate::{
    dto::auth::Claims, entity::users::Entity as Users, error::AppError, models::Role,
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub role: Role,
}

/// Rejects the caller unless its role grants the capability.
pub fn ensure(user: &AuthUser, capability: fn(Role) -> bool) -> Result<(), AppError> {
    if !capability(user.role) {
        tracing::debug!(user_id = user.user_id, role = ?user.role, "capability check failed");
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure(user, Role::can_manage_catalog)
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthenticated)?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::BadRequest("Invalid Authorization scheme".into()))?
            .trim();

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthenticated)?;

        let user_id = decoded
            .claims
            .sub
            .parse::<i32>()
            .map_err(|_| AppError::BadRequest("Invalid user id in token".into()))?;

        // The account is reloaded so deletions and role changes apply at once. Row ids
        // can be reused after an import, hence the login check.
        let account = Users::find_by_id(user_id)
            .one(&state.orm)
            .await?
            .filter(|account| account.login == decoded.claims.login)
            .ok_or(AppError::Unauthenticated)?;

        Ok(AuthUser {
            user_id: account.id,
            role: account.role,
        })
    }
}
