use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
mod repo;
mod repo_types;
pub mod services;

pub use repo_types::{NewUser, User, UserChanges};

pub fn router() -> Router<AppState> {
    handlers::admin_routes()
}
