//! User DTOs - account payloads exchanged with the client

use crate::entities::{User, UserRole};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.-]+$").unwrap();
}

/// Public profile, never carries the password hash
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserDTO {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub team_role: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for UserDTO {
    fn from(value: User) -> Self {
        Self {
            id: value.user_id,
            username: value.username,
            email: value.email,
            role: value.role,
            team_role: value.team_role,
            bio: value.bio,
            avatar: value.avatar,
            created_at: value.created_at,
            last_login: value.last_login,
        }
    }
}

/// Registration payload. `password` holds the hash once it reaches the repository.
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateUserDTO {
    #[validate(
        length(min = 3, max = 32, message = "Username must be between 3 and 32 characters"),
        regex(path = *USERNAME_RE, message = "Username may only contain letters, digits, '.', '-' and '_'")
    )]
    pub username: String,

    #[validate(email(message = "Email is not valid"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginDTO {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AuthResponseDTO {
    pub token: String,
    pub user: UserDTO,
}

/// Self-service profile changes. Unknown fields such as `email`, `password`
/// or `role` are dropped by serde and never reach the database.
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateProfileDTO {
    #[validate(length(max = 64))]
    pub team_role: Option<String>,
    #[validate(length(max = 1000))]
    pub bio: Option<String>,
    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar: Option<String>,
}

#[derive(Deserialize, Debug, Validate)]
pub struct ChangePasswordDTO {
    pub current_password: String,
    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub new_password: String,
}

#[derive(Deserialize, Debug)]
pub struct UpdateRoleDTO {
    pub role: UserRole,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponseDTO {
    pub message: String,
}
