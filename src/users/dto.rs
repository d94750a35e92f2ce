use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{error::AppError, users::repo_types::User};

pub const MIN_PASSWORD_LEN: usize = 4;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Request body for user creation.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// A creation request that passed validation.
#[derive(Debug)]
pub struct ValidCreateUser {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl CreateUserRequest {
    pub fn validate(self) -> Result<ValidCreateUser, AppError> {
        let email = self.email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AppError::Validation("Invalid email".into()));
        }
        let username = self.username.trim().to_string();
        if username.is_empty() {
            return Err(AppError::Validation("Username is required".into()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        Ok(ValidCreateUser {
            email,
            username,
            password: self.password,
        })
    }
}

/// Public projection of a user; the password hash never leaves the service.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserView {
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        Self {
            user_id: u.user_id,
            email: u.email,
            username: u.username,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedUserResponse {
    pub new_user: UserView,
}
