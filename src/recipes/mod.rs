use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod pagination;
pub mod query;
mod repo;
mod repo_types;
pub mod services;

pub use repo_types::{Category, InvalidCategory, NewRecipe, Recipe};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::owned_routes())
        .merge(handlers::public_routes())
}
