use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    auth::password::{hash_password, PasswordHashing},
    error::{AppError, AppResult},
    users::{
        dto::ValidCreateUser,
        repo::UserRepository,
        repo_types::{NewUser, User},
    },
};

/// Owns user records: uniqueness, hashing, lookup.
#[derive(Clone)]
pub struct CredentialStore {
    repo: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHashing>,
}

impl CredentialStore {
    pub fn new(repo: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHashing>) -> Self {
        Self { repo, hasher }
    }

    pub fn hasher(&self) -> Arc<dyn PasswordHashing> {
        self.hasher.clone()
    }

    /// The pre-check only gives a cheaper, clearer failure; the repository's
    /// unique index is what actually enforces uniqueness under concurrency.
    pub async fn create(&self, input: ValidCreateUser) -> AppResult<User> {
        if self.repo.find_by_username(&input.username).await?.is_some() {
            warn!(username = %input.username, "username already exists");
            return Err(AppError::Conflict("Username already exists".into()));
        }

        let password_hash = hash_password(self.hasher.clone(), input.password).await?;

        let user = self
            .repo
            .create(NewUser {
                user_id: Uuid::new_v4(),
                email: input.email,
                username: input.username,
                password_hash,
            })
            .await
            .map_err(|e| {
                warn!(error = %e, "user insert rejected");
                AppError::from(e)
            })?;

        info!(user_id = %user.user_id, username = %user.username, "user created");
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = self.repo.find_by_username(username).await?;
        debug!(username, found = user.is_some(), "user lookup");
        Ok(user)
    }

    pub async fn find_all(&self) -> AppResult<Vec<User>> {
        Ok(self.repo.find_all().await?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::password::tests::{test_hasher, CountingHasher};
    use crate::users::{
        memory::InMemoryUserRepository,
        repo::{RepoError, RepoResult},
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) fn memory_store() -> CredentialStore {
        CredentialStore::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(test_hasher()),
        )
    }

    fn alice() -> ValidCreateUser {
        ValidCreateUser {
            email: "a@x.com".into(),
            username: "alice".into(),
            password: "Secret123".into(),
        }
    }

    /// Counts inserts, delegating to the in-memory store.
    #[derive(Default)]
    struct CountingRepo {
        inner: InMemoryUserRepository,
        inserts: AtomicUsize,
    }

    #[async_trait]
    impl UserRepository for CountingRepo {
        async fn create(&self, user: NewUser) -> RepoResult<User> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            self.inner.create(user).await
        }
        async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
            self.inner.find_by_username(username).await
        }
        async fn find_all(&self) -> RepoResult<Vec<User>> {
            self.inner.find_all().await
        }
    }

    /// Simulates a concurrent insert landing between the pre-check and ours.
    struct RacingRepo;

    #[async_trait]
    impl UserRepository for RacingRepo {
        async fn create(&self, _user: NewUser) -> RepoResult<User> {
            Err(RepoError::DuplicateUsername)
        }
        async fn find_by_username(&self, _username: &str) -> RepoResult<Option<User>> {
            Ok(None)
        }
        async fn find_all(&self) -> RepoResult<Vec<User>> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn create_stores_verifiable_hash() {
        let store = memory_store();
        let user = store.create(alice()).await.expect("create");
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "a@x.com");
        assert_ne!(user.password_hash, "Secret123");
        assert!(test_hasher()
            .verify("Secret123", &user.password_hash)
            .expect("verify"));
    }

    #[tokio::test]
    async fn create_generates_random_user_ids() {
        let store = memory_store();
        let a = store.create(alice()).await.expect("create");
        let b = store
            .create(ValidCreateUser {
                username: "bob".into(),
                ..alice()
            })
            .await
            .expect("create");
        assert_ne!(a.user_id, b.user_id);
        assert_eq!(a.user_id.get_version_num(), 4);
    }

    #[tokio::test]
    async fn duplicate_username_skips_hash_and_insert() {
        let repo = Arc::new(CountingRepo::default());
        let hasher = Arc::new(CountingHasher::default());
        let store = CredentialStore::new(repo.clone(), hasher.clone());

        store.create(alice()).await.expect("first create");
        assert_eq!(repo.inserts.load(Ordering::SeqCst), 1);
        assert_eq!(hasher.hashes.load(Ordering::SeqCst), 1);

        let err = store.create(alice()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(repo.inserts.load(Ordering::SeqCst), 1);
        assert_eq!(hasher.hashes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn index_rejection_surfaces_as_conflict() {
        let store = CredentialStore::new(Arc::new(RacingRepo), Arc::new(test_hasher()));
        let err = store.create(alice()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == "Username already exists"));
    }

    #[tokio::test]
    async fn find_all_returns_every_record() {
        let store = memory_store();
        store.create(alice()).await.expect("create");
        store
            .create(ValidCreateUser {
                username: "bob".into(),
                ..alice()
            })
            .await
            .expect("create");
        let all = store.find_all().await.expect("list");
        assert_eq!(all.len(), 2);
        assert!(store.find_by_username("carol").await.unwrap().is_none());
    }
}
