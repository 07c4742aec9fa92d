use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequestParts, OriginalUri, Path, Query, State,
    },
    http::{request::Parts, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{RecipeListParams, RecipePayload},
    pagination::Page,
    query::Scope,
    repo_types::Recipe,
    services::{ensure_owner, fetch_page, validate_recipe},
};
use crate::{
    auth::CurrentUser,
    error::{ApiError, ApiResult},
    state::AppState,
};

pub fn owned_routes() -> Router<AppState> {
    Router::new()
        .route("/user/recipes", get(list_own).post(create_own))
        .route(
            "/user/recipes/:id",
            get(get_own).put(update_own).delete(delete_own),
        )
}

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/recipes", get(list_public))
        .route("/api/recipes/:id", get(get_public))
}

fn recipe_not_found() -> ApiError {
    ApiError::NotFound("Recipe not found.".into())
}

/// `:id` of a recipe route. An id that is not a UUID reads as a missing recipe.
pub struct RecipeId(pub Uuid);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RecipeId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                debug!(error = %e, "unparsable recipe id");
                recipe_not_found()
            })?;
        Ok(RecipeId(id))
    }
}

// --- owned recipes ---

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_own(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    OriginalUri(uri): OriginalUri,
    params: Result<Query<RecipeListParams>, QueryRejection>,
) -> ApiResult<Json<Page<Recipe>>> {
    let Query(params) = params?;
    let page = fetch_page(&state.db, Scope::OwnedBy(user.id), &params, &uri).await?;
    Ok(Json(page))
}

#[instrument(skip_all, fields(user_id = %user.id, %id))]
pub async fn get_own(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    RecipeId(id): RecipeId,
) -> ApiResult<Json<Recipe>> {
    let recipe = Recipe::find(&state.db, Scope::OwnedBy(user.id), id)
        .await?
        .ok_or_else(recipe_not_found)?;
    Ok(Json(recipe))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create_own(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<RecipePayload>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Recipe>)> {
    let Json(payload) = payload?;
    let new = validate_recipe(payload)?;
    ensure_owner(&new, user.id).inspect_err(|_| {
        warn!(declared = %new.user_id, "recipe create for another user");
    })?;

    let recipe = Recipe::create(&state.db, &new).await?;
    info!(recipe_id = %recipe.id, title = %recipe.title, "recipe created");
    Ok((StatusCode::CREATED, Json(recipe)))
}

#[instrument(skip_all, fields(user_id = %user.id, %id))]
pub async fn update_own(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    RecipeId(id): RecipeId,
    payload: Result<Json<RecipePayload>, JsonRejection>,
) -> ApiResult<Json<Recipe>> {
    if Recipe::find(&state.db, Scope::OwnedBy(user.id), id).await?.is_none() {
        return Err(recipe_not_found());
    }

    let Json(payload) = payload?;
    let new = validate_recipe(payload)?;
    ensure_owner(&new, user.id).inspect_err(|_| {
        warn!(declared = %new.user_id, "recipe update naming another user");
    })?;

    // The row may have been deleted since the lookup above.
    let recipe = Recipe::update_owned(&state.db, user.id, id, &new)
        .await?
        .ok_or_else(recipe_not_found)?;
    info!(recipe_id = %recipe.id, "recipe updated");
    Ok(Json(recipe))
}

#[instrument(skip_all, fields(user_id = %user.id, %id))]
pub async fn delete_own(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    RecipeId(id): RecipeId,
) -> ApiResult<StatusCode> {
    if !Recipe::delete_owned(&state.db, user.id, id).await? {
        return Err(recipe_not_found());
    }
    info!(recipe_id = %id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}

// --- public catalog ---

#[instrument(skip_all)]
pub async fn list_public(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    params: Result<Query<RecipeListParams>, QueryRejection>,
) -> ApiResult<Json<Page<Recipe>>> {
    let Query(params) = params?;
    let page = fetch_page(&state.db, Scope::All, &params, &uri).await?;
    Ok(Json(page))
}

#[instrument(skip_all, fields(%id))]
pub async fn get_public(
    State(state): State<AppState>,
    RecipeId(id): RecipeId,
) -> ApiResult<Json<Recipe>> {
    let recipe = Recipe::find(&state.db, Scope::All, id)
        .await?
        .ok_or_else(recipe_not_found)?;
    Ok(Json(recipe))
}
