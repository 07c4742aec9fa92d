use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, MessageResponse},
        jwt::JwtKeys,
        password::verify_password,
        services::{cleared_session_cookie, session_cookie, CurrentUser},
    },
    error::{ApiError, ApiResult},
    state::AppState,
    users::{
        dto::{PublicUser, UserPayload},
        services::create_user,
        User,
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/user", get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> ApiResult<Json<PublicUser>> {
    let Json(payload) = payload?;
    let user = create_user(&state.db, payload).await?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(user.into()))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    let Json(payload) = payload?;
    let email = payload.email.trim().to_lowercase();

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;
    let cookie = session_cookie(&state.config.cookie, token.clone(), keys.ttl);

    info!(user_id = %user.id, "user logged in");
    Ok((jar.add(cookie), Json(LoginResponse { jwt: token })))
}

/// Drops the cookie. The token itself stays valid until it expires.
#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.remove(cleared_session_cookie(&state.config.cookie));
    (
        jar,
        Json(MessageResponse {
            message: "Logout Done".into(),
        }),
    )
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<PublicUser> {
    Json(user.into())
}
