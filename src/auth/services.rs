use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::{
    auth::{
        claims::{Subject, TokenPair},
        jwt::{TokenKeys, TokenKind},
        password::verify_password,
    },
    error::{AppError, AppResult},
    users::{dto::UserView, repo_types::User, services::CredentialStore},
};

/// Result of a successful sign-in.
#[derive(Debug)]
pub struct SignedIn {
    pub user: UserView,
    pub tokens: TokenPair,
}

/// Validates credentials and issues, verifies and rotates token pairs.
/// Holds no session state: being signed in means holding a valid pair.
#[derive(Clone)]
pub struct TokenAuthority {
    store: CredentialStore,
    keys: Arc<TokenKeys>,
}

impl TokenAuthority {
    pub fn new(store: CredentialStore, keys: TokenKeys) -> Self {
        Self {
            store,
            keys: Arc::new(keys),
        }
    }

    pub fn keys(&self) -> &TokenKeys {
        &self.keys
    }

    /// Unknown user and wrong password both yield `None`. An unknown user
    /// returns before any hash comparison.
    pub async fn validate_credentials(&self, username: &str, password: &str) -> AppResult<Option<User>> {
        let Some(user) = self.store.find_by_username(username).await? else {
            warn!(username, "sign-in for unknown user");
            return Ok(None);
        };

        let ok = verify_password(
            self.store.hasher(),
            password.to_string(),
            user.password_hash.clone(),
        )
        .await?;

        if !ok {
            warn!(username, user_id = %user.user_id, "sign-in with wrong password");
            return Ok(None);
        }
        Ok(Some(user))
    }

    pub async fn sign_in(&self, username: &str, password: &str) -> AppResult<SignedIn> {
        let user = self
            .validate_credentials(username, password)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let subject = Subject {
            id: user.user_id,
            username: user.username.clone(),
        };
        let tokens = self
            .keys
            .issue_pair(&subject)
            .context("sign token pair")?;

        info!(user_id = %user.user_id, username = %user.username, "user signed in");
        Ok(SignedIn {
            user: user.into(),
            tokens,
        })
    }

    /// Full rotation: a valid refresh token buys a brand new pair for the same
    /// subject. Every verification failure collapses to `InvalidOrExpiredToken`.
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<TokenPair> {
        let claims = self
            .keys
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|e| {
                warn!(error = %e, "refresh token rejected");
                AppError::InvalidOrExpiredToken
            })?;

        let subject = Subject::from(&claims);
        let tokens = self
            .keys
            .issue_pair(&subject)
            .context("sign rotated token pair")?;

        info!(user_id = %subject.id, "token pair rotated");
        Ok(tokens)
    }

    /// Bearer check for protected calls; only access tokens pass.
    pub fn authenticate(&self, access_token: &str) -> AppResult<Subject> {
        self.keys
            .verify(access_token, TokenKind::Access)
            .map(|claims| Subject::from(&claims))
            .map_err(|e| {
                warn!(error = %e, "access token rejected");
                AppError::Unauthorized("Invalid or expired token".into())
            })
    }
}
