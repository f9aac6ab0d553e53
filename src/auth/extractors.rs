use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{jwt::JwtKeys, repo_types::User, services::resolve_current_user};
use crate::{error::AppError, state::AppState};

/// The authenticated user behind the request's bearer token.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Non-ASCII header bytes count as malformed.
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .map(|h| h.to_str().unwrap_or_default());

        let keys = JwtKeys::from_ref(state);
        let user = resolve_current_user(state.store.as_ref(), &keys, header).await?;
        Ok(CurrentUser(user))
    }
}
