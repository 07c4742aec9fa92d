use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::warn;

pub(crate) use super::claims::Claims;
use super::jwt::{JwtKeys, TokenError};
use crate::{config::CookieConfig, error::ApiError, state::AppState, users::User};

/// Verified token payload from the session cookie. Does not touch the store.
pub struct AuthClaims(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthClaims {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(&state.config.cookie.name)
            .map(|c| c.value().to_owned())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Unauthenticated! Please log in.".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(&token).map_err(|e| {
            warn!(error = %e, "session token rejected");
            match e {
                TokenError::Expired => ApiError::Unauthorized("Token expired.".into()),
                TokenError::Invalid(_) => ApiError::Unauthorized("Invalid token!".into()),
            }
        })?;

        Ok(AuthClaims(claims))
    }
}

/// The authenticated user behind the session cookie.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthClaims(claims) = AuthClaims::from_request_parts(parts, state).await?;
        let user = User::find_by_id(&state.db, claims.sub)
            .await?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token for unknown user");
                ApiError::Unauthorized("User not found!".into())
            })?;
        Ok(CurrentUser(user))
    }
}

/// `HttpOnly` cookie carrying `token` for as long as the token is valid.
pub fn session_cookie(cfg: &CookieConfig, token: String, ttl: Duration) -> Cookie<'static> {
    Cookie::build((cfg.name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cfg.secure)
        .max_age(time::Duration::seconds(ttl.as_secs() as i64))
        .build()
}

/// Cookie with the session cookie's name and attributes, for removal.
pub fn cleared_session_cookie(cfg: &CookieConfig) -> Cookie<'static> {
    Cookie::build((cfg.name.clone(), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cfg.secure)
        .build()
}
