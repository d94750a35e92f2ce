use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::users::repo_types::{NewUser, User};

#[derive(Debug, Error)]
pub enum RepoError {
    /// The store's unique index rejected the insert.
    #[error("username already exists")]
    DuplicateUsername,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Durable storage for user records.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a record; must fail with `DuplicateUsername` if the username is taken,
    /// even when a concurrent insert slipped past the caller's pre-check.
    async fn create(&self, user: NewUser) -> RepoResult<User>;

    /// Exact-match lookup.
    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>>;

    async fn find_all(&self) -> RepoResult<Vec<User>>;
}

pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> RepoResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, email, username, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, email, username, password_hash, created_at, updated_at
            "#,
        )
        .bind(user.user_id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(map_insert_error)
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, username, password_hash, created_at, updated_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_all(&self) -> RepoResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, email, username, password_hash, created_at, updated_at
            FROM users
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }
}

fn map_insert_error(e: sqlx::Error) -> RepoError {
    match e.as_database_error() {
        Some(db)
            if db.is_unique_violation() && db.constraint() != Some("users_user_id_key") =>
        {
            RepoError::DuplicateUsername
        }
        _ => RepoError::Database(e),
    }
}
