use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record as persisted. Never serialized directly; see `UserView`.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,                // random, generated on create
    pub email: String,
    pub username: String,             // unique index
    pub password_hash: String,        // Argon2 PHC string
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields the application supplies on insert; the store stamps the rest.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
}
