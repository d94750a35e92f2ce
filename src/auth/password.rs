use std::sync::Arc;

use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

/// Adaptive, salted one-way password hashing.
pub trait PasswordHashing: Send + Sync {
    fn hash(&self, plain: &str) -> anyhow::Result<String>;

    /// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
    fn verify(&self, plain: &str, hash: &str) -> anyhow::Result<bool>;
}

/// Argon2id with a fixed work factor. The parameters are encoded into every
/// PHC string, so verification does not depend on the current settings.
#[derive(Clone)]
pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    /// 19 MiB, 2 passes, 1 lane.
    pub const MEMORY_KIB: u32 = 19 * 1024;
    pub const ITERATIONS: u32 = 2;
    pub const LANES: u32 = 1;

    pub fn new(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::new(
            Params::new(Self::MEMORY_KIB, Self::ITERATIONS, Self::LANES, None)
                .unwrap_or_default(),
        )
    }
}

impl PasswordHashing for Argon2Hasher {
    fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    fn verify(&self, plain: &str, hash: &str) -> anyhow::Result<bool> {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            anyhow::anyhow!(e.to_string())
        })?;
        Ok(self
            .argon2()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }
}

/// Runs the hash on the blocking pool so slow hashing does not stall other requests.
pub async fn hash_password(hasher: Arc<dyn PasswordHashing>, plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hasher.hash(&plain))
        .await
        .context("password hashing task failed")?
}

pub async fn verify_password(
    hasher: Arc<dyn PasswordHashing>,
    plain: String,
    hash: String,
) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || hasher.verify(&plain, &hash))
        .await
        .context("password verification task failed")?
}
