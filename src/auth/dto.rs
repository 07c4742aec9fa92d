use serde::{Deserialize, Serialize};

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after login. The same token is also set as a cookie.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub jwt: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
