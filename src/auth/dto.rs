use serde::{Deserialize, Serialize};

use crate::{error::AppError, users::dto::UserView};

/// Request body for login.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    /// Only shape checks here; content checks would leak which field was wrong.
    pub fn validate(self) -> Result<Self, AppError> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(AppError::Validation(
                "username and password are required".into(),
            ));
        }
        Ok(Self {
            username: self.username.trim().to_string(),
            password: self.password,
        })
    }
}

/// Response returned after login. The refresh token travels in a cookie.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserView,
    pub access_token: String,
}

/// Response returned after refresh.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}
