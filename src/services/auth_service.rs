use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::{
    dto::auth::{Claims, LoginRequest, LoginResponse},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    models::{Role, User},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Stored in place of a hash for accounts that cannot log in with a password.
pub const UNUSABLE_PASSWORD: &str = "!";

/// Login of the shared account behind guest sessions.
pub const GUEST_LOGIN: &str = "guest_user";

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(stored_hash: &str, password: &str) -> bool {
    if stored_hash == UNUSABLE_PASSWORD {
        return false;
    }
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        tracing::warn!("stored password hash is malformed");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { login, password } = payload;
    let user = Users::find()
        .filter(UserCol::Login.eq(login.as_str()))
        .one(&state.orm)
        .await?;

    let user = match user {
        Some(u) if verify_password(&u.password_hash, &password) => u,
        _ => return Err(AppError::BadRequest("Invalid login or password".into())),
    };

    let token = issue_token(&state.jwt_secret, &user)?;
    tracing::info!(user_id = user.id, role = ?user.role, "user logged in");

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token,
            user: user_from_entity(user),
        },
        Some(Meta::empty()),
    ))
}

/// Logs in as the shared guest account, creating it on first use.
pub async fn guest_login(state: &AppState) -> AppResult<ApiResponse<LoginResponse>> {
    let guest = match find_guest(state).await? {
        Some(user) => user,
        None => {
            let created = UserActive {
                login: Set(GUEST_LOGIN.to_string()),
                password_hash: Set(UNUSABLE_PASSWORD.to_string()),
                role: Set(Role::Guest),
                last_name: Set(String::new()),
                first_name: Set(String::new()),
                patronymic: Set(String::new()),
                is_staff: Set(false),
                is_superuser: Set(false),
                ..Default::default()
            }
            .insert(&state.orm)
            .await;
            match created {
                Ok(user) => {
                    tracing::info!(user_id = user.id, "guest account created");
                    user
                }
                // Another request created it first.
                Err(err) => find_guest(state).await?.ok_or(AppError::OrmError(err))?,
            }
        }
    };

    let token = issue_token(&state.jwt_secret, &guest)?;
    Ok(ApiResponse::success(
        "Logged in as guest",
        LoginResponse {
            token,
            user: user_from_entity(guest),
        },
        Some(Meta::empty()),
    ))
}

async fn find_guest(state: &AppState) -> AppResult<Option<UserModel>> {
    Ok(Users::find()
        .filter(UserCol::Login.eq(GUEST_LOGIN))
        .one(&state.orm)
        .await?)
}

pub fn issue_token(secret: &str, user: &UserModel) -> AppResult<String> {
    if secret.is_empty() {
        return Err(AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")));
    }
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        login: user.login.clone(),
        role: user.role,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub(crate) fn user_from_entity(model: UserModel) -> User {
    User {
        display_name: model.display_name(),
        id: model.id,
        login: model.login,
        role: model.role,
        is_staff: model.is_staff,
        is_superuser: model.is_superuser,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("secret").unwrap();
        assert!(verify_password(&hash, "secret"));
        assert!(!verify_password(&hash, "other"));
    }

    #[test]
    fn unusable_password_never_verifies() {
        assert!(!verify_password(UNUSABLE_PASSWORD, ""));
        assert!(!verify_password(UNUSABLE_PASSWORD, "!"));
    }
}
