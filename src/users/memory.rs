use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::users::{
    repo::{RepoError, RepoResult, UserRepository},
    repo_types::{NewUser, User},
};

/// Process-local store keyed by username. The map key plays the role of the
/// unique index, so duplicate inserts are rejected the same way Postgres does.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> RepoResult<User> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.username) {
            return Err(RepoError::DuplicateUsername);
        }
        let now = OffsetDateTime::now_utc();
        let record = User {
            user_id: user.user_id,
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.insert(record.username.clone(), record.clone());
        Ok(record)
    }

    async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        Ok(self.users.read().await.get(username).cloned())
    }

    async fn find_all(&self) -> RepoResult<Vec<User>> {
        let mut all: Vec<User> = self.users.read().await.values().cloned().collect();
        all.sort_by_key(|u| u.created_at);
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn new_user(username: &str) -> NewUser {
        NewUser {
            user_id: Uuid::new_v4(),
            email: format!("{username}@example.com"),
            username: username.into(),
            password_hash: "$argon2id$placeholder".into(),
        }
    }

    #[tokio::test]
    async fn create_then_find() {
        let repo = InMemoryUserRepository::new();
        let created = repo.create(new_user("alice")).await.expect("create");
        let found = repo
            .find_by_username("alice")
            .await
            .expect("lookup")
            .expect("present");
        assert_eq!(found.user_id, created.user_id);
        assert_eq!(found.created_at, found.updated_at);
    }

    #[tokio::test]
    async fn lookup_is_exact_match() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("alice")).await.expect("create");
        assert!(repo.find_by_username("Alice").await.unwrap().is_none());
        assert!(repo.find_by_username("alic").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let repo = InMemoryUserRepository::new();
        repo.create(new_user("bob")).await.expect("first insert");
        let err = repo.create(new_user("bob")).await.unwrap_err();
        assert!(matches!(err, RepoError::DuplicateUsername));
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }
}
