use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;

use crate::{
    auth::{jwt::TokenKeys, password::Argon2Hasher, services::TokenAuthority},
    config::{AppConfig, StoreKind},
    db,
    users::{
        memory::InMemoryUserRepository,
        repo::{PgUserRepository, UserRepository},
        services::CredentialStore,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: CredentialStore,
    pub auth: TokenAuthority,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let repo: Arc<dyn UserRepository> = match config.store {
            StoreKind::Postgres => {
                let url = config
                    .database_url
                    .as_deref()
                    .context("DATABASE_URL is not set")?;
                Arc::new(PgUserRepository::new(db::connect(url).await?))
            }
            StoreKind::Memory => {
                tracing::warn!("using in-memory user store; records are lost on restart");
                Arc::new(InMemoryUserRepository::new())
            }
        };
        let users = CredentialStore::new(repo, Arc::new(Argon2Hasher::default()));
        Ok(Self::from_parts(Arc::new(config), users))
    }

    pub fn from_parts(config: Arc<AppConfig>, users: CredentialStore) -> Self {
        let auth = TokenAuthority::new(users.clone(), TokenKeys::from_config(&config.jwt));
        Self {
            config,
            users,
            auth,
        }
    }
}

impl FromRef<AppState> for TokenAuthority {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<AppState> for CredentialStore {
    fn from_ref(state: &AppState) -> Self {
        state.users.clone()
    }
}
