//! User administration under `/api/users`. Any authenticated caller may use it.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    dto::{PublicUser, UserPayload},
    services::{create_user, update_user, UserWrite},
    User,
};
use crate::{
    auth::CurrentUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found.".into())
}

/// `:id` of a user route. An id that is not a UUID reads as a missing user.
pub struct UserId(pub Uuid);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for UserId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                debug!(error = %e, "unparsable user id");
                user_not_found()
            })?;
        Ok(UserId(id))
    }
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create))
        .route(
            "/api/users/:id",
            get(get_user).put(replace).patch(patch).delete(delete),
        )
}

#[instrument(skip_all, fields(caller = %caller.id))]
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
) -> ApiResult<Json<Vec<PublicUser>>> {
    let users = User::list(&state.db).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[instrument(skip_all, fields(caller = %caller.id))]
pub async fn create(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PublicUser>)> {
    let Json(payload) = payload?;
    let user = create_user(&state.db, payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip_all, fields(caller = %caller.id, %id))]
pub async fn get_user(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    UserId(id): UserId,
) -> ApiResult<Json<PublicUser>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(user_not_found)?;
    Ok(Json(user.into()))
}

#[instrument(skip_all, fields(caller = %caller.id, %id))]
pub async fn replace(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    UserId(id): UserId,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> ApiResult<Json<PublicUser>> {
    let Json(payload) = payload?;
    let user = update_user(&state.db, id, payload, UserWrite::Replace).await?;
    Ok(Json(user.into()))
}

#[instrument(skip_all, fields(caller = %caller.id, %id))]
pub async fn patch(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    UserId(id): UserId,
    payload: Result<Json<UserPayload>, JsonRejection>,
) -> ApiResult<Json<PublicUser>> {
    let Json(payload) = payload?;
    let user = update_user(&state.db, id, payload, UserWrite::Patch).await?;
    Ok(Json(user.into()))
}

#[instrument(skip_all, fields(caller = %caller.id, %id))]
pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(caller): CurrentUser,
    UserId(id): UserId,
) -> ApiResult<StatusCode> {
    if !User::delete(&state.db, id).await? {
        return Err(user_not_found());
    }
    info!(user_id = %id, "user deleted with their recipes");
    Ok(StatusCode::NO_CONTENT)
}
