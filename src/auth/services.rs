use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};

use super::{
    dto::{LoginRequest, RegisterRequest, TokenResponse},
    jwt::JwtKeys,
    password::{hash_password, verify_password},
    repo_types::User,
};
use crate::{error::AppError, store::Store};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Usernames are mention targets, so they must be a single `\w+` token.
pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^\w{1,64}$").unwrap();
    }
    USERNAME_RE.is_match(username)
}

pub async fn register(
    store: &dyn Store,
    keys: &JwtKeys,
    mut payload: RegisterRequest,
) -> Result<TokenResponse, AppError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.username = payload.username.trim().to_string();

    if !is_valid_email(&payload.email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    if !is_valid_username(&payload.username) {
        return Err(AppError::Validation(
            "Username must be 1-64 letters, digits or underscores".into(),
        ));
    }
    if payload.password.len() < 8 {
        return Err(AppError::Validation("Password too short".into()));
    }

    if store.find_user_by_email(&payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }
    if store
        .find_user_by_username(&payload.username)
        .await?
        .is_some()
    {
        warn!(username = %payload.username, "username already taken");
        return Err(AppError::Conflict("Username already taken".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = store
        .create_user(&payload.email, &payload.username, &hash)
        .await?;

    let token = keys.sign(&user.email)?;
    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(TokenResponse::bearer(token))
}

pub async fn login(
    store: &dyn Store,
    keys: &JwtKeys,
    payload: LoginRequest,
) -> Result<TokenResponse, AppError> {
    let email = payload.email.trim().to_lowercase();

    let Some(user) = store.find_user_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    // An unreadable stored hash answers like a wrong password.
    match verify_password(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            warn!(user_id = %user.id, "login invalid password");
            return Err(AppError::InvalidCredentials);
        }
        Err(e) => {
            error!(user_id = %user.id, error = ?e, "stored password hash unreadable");
            return Err(AppError::InvalidCredentials);
        }
    }

    let token = keys.sign(&user.email)?;
    info!(user_id = %user.id, "user logged in");
    Ok(TokenResponse::bearer(token))
}

/// Resolves the bearer of an `Authorization` header value to a stored user.
pub async fn resolve_current_user(
    store: &dyn Store,
    keys: &JwtKeys,
    authorization: Option<&str>,
) -> Result<User, AppError> {
    let header = authorization
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header".into()))?;

    let claims = keys.verify(token).map_err(|_| {
        warn!("invalid or expired token");
        AppError::Unauthorized("Invalid or expired token".into())
    })?;

    store
        .find_user_by_email(&claims.sub)
        .await?
        .ok_or_else(|| {
            warn!("token subject has no user");
            AppError::Unauthorized("User not found".into())
        })
}
