use lazy_static::lazy_static;
use regex::Regex;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{
    dto::UserPayload,
    repo_types::{NewUser, User, UserChanges},
};
use crate::{
    auth::password::{check_password_policy, hash_password},
    error::{ApiError, ApiResult, FieldError},
};

const MAX_USERNAME_LEN: usize = 255;
const REQUIRED: &str = "This field is required.";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_username(username: &str) -> bool {
    lazy_static! {
        static ref USERNAME_RE: Regex = Regex::new(r"^[\w.@+-]+$").unwrap();
    }
    USERNAME_RE.is_match(username) && username.chars().count() <= MAX_USERNAME_LEN
}

/// Which fields an operation insists on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserWrite {
    /// Registration and admin create: everything.
    Create,
    /// `PUT`: username and email; password optional.
    Replace,
    /// `PATCH`: nothing.
    Patch,
}

/// Checked, normalized user fields with the password still in plain text.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct UserInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

pub fn validate_user(payload: UserPayload, mode: UserWrite) -> ApiResult<UserInput> {
    let mut errors = Vec::new();

    let username = payload.username.map(|u| u.trim().to_string());
    match username.as_deref() {
        None | Some("") if mode != UserWrite::Patch || username.is_some() => {
            errors.push(FieldError::new("username", REQUIRED))
        }
        Some(u) if !is_valid_username(u) => errors.push(FieldError::new(
            "username",
            "Enter a valid username. Letters, digits and @/./+/-/_ only.",
        )),
        _ => {}
    }

    let email = payload.email.map(|e| e.trim().to_lowercase());
    match email.as_deref() {
        None | Some("") if mode != UserWrite::Patch || email.is_some() => {
            errors.push(FieldError::new("email", REQUIRED))
        }
        Some(e) if !is_valid_email(e) => {
            errors.push(FieldError::new("email", "Enter a valid email address."))
        }
        _ => {}
    }

    match payload.password.as_deref() {
        None if mode == UserWrite::Create => errors.push(FieldError::new("password", REQUIRED)),
        Some(p) => {
            if let Err(msg) = check_password_policy(p) {
                errors.push(FieldError::new("password", msg));
            }
        }
        None => {}
    }

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    Ok(UserInput {
        username,
        email,
        password: payload.password,
    })
}

/// Validate, hash and insert. Shared by `/register` and `POST /api/users`.
pub async fn create_user(db: &PgPool, payload: UserPayload) -> ApiResult<User> {
    let input = validate_user(payload, UserWrite::Create)?;
    let (Some(username), Some(email), Some(password)) =
        (input.username, input.email, input.password)
    else {
        return Err(ApiError::field("non_field_errors", REQUIRED));
    };

    let new = NewUser {
        username,
        email,
        password_hash: hash_password(&password)?,
    };
    let user = User::create(db, &new).await?;
    info!(user_id = %user.id, username = %user.username, "user created");
    Ok(user)
}

pub async fn update_user(
    db: &PgPool,
    id: Uuid,
    payload: UserPayload,
    mode: UserWrite,
) -> ApiResult<User> {
    let input = validate_user(payload, mode)?;
    let password_hash = match input.password.as_deref() {
        Some(p) => Some(hash_password(p)?),
        None => None,
    };
    let changes = UserChanges {
        username: input.username,
        email: input.email,
        password_hash,
    };
    let user = User::update(db, id, &changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".into()))?;
    info!(user_id = %user.id, password_changed = changes.password_hash.is_some(), "user updated");
    Ok(user)
}
