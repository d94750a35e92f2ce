use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload shared by access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,        // user ID
    pub username: String,
    pub iat: i64,         // issued at (unix timestamp)
    pub exp: i64,         // expires at (unix timestamp)
    pub iss: String,      // issuer
    pub jti: Uuid,        // unique per token
}

/// Subject identity carried from sign-in through every rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: Uuid,
    pub username: String,
}

impl From<&Claims> for Subject {
    fn from(c: &Claims) -> Self {
        Self {
            id: c.sub,
            username: c.username.clone(),
        }
    }
}

/// Freshly signed access/refresh tokens. Never persisted.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
