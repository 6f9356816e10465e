use serde::{Deserialize, Serialize};

use crate::entity::user::{self, SENTINEL_USERNAME};
use crate::error::{AppError, ValidationErrors};

/// Request body for user registration.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Unique username (1-32 chars, alphanumeric and underscores).
    #[schema(example = "alice")]
    pub username: String,
    /// Password (8-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_register_request(payload: &RegisterRequest) -> Result<(), AppError> {
    let mut errors = ValidationErrors::new();
    let username = payload.username.trim();
    if username.is_empty() || username.chars().count() > 32 {
        errors.add("username", "Username must be 1-32 characters");
    } else if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        errors.add(
            "username",
            "Username must contain only letters, digits, and underscores",
        );
    } else if username.eq_ignore_ascii_case(SENTINEL_USERNAME) {
        errors.add("username", "This username is reserved");
    }
    if payload.password.len() < 8 || payload.password.len() > 128 {
        errors.add("password", "Password must be 8-128 characters");
    }
    errors.into_result()
}

/// Request body for user login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    let mut errors = ValidationErrors::new();
    if payload.username.trim().is_empty() {
        errors.add("username", "Username must not be empty");
    }
    if payload.password.is_empty() {
        errors.add("password", "Password must not be empty");
    }
    errors.into_result()
}

/// A user account.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = 42)]
    pub id: i32,
    #[schema(example = "alice")]
    pub username: String,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// Bearer token; send as `Authorization: Bearer <token>`.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    #[schema(example = "alice")]
    pub username: String,
}
