use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::User;

/// Body for registration and user creation. Fields are optional here so that
/// missing ones are reported together as validation errors.
#[derive(Debug, Default, Deserialize)]
pub struct UserPayload {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_superuser: bool,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            is_superuser: u.is_superuser,
        }
    }
}
