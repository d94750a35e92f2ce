use std::time::Duration;

use anyhow::Context;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{
    auth::claims::{Claims, Subject, TokenPair},
    config::JwtConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Clone)]
struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKey {
    fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

/// HS256 keys for both token kinds. Each kind has its own secret, so a token
/// of one kind never verifies as the other.
#[derive(Clone)]
pub struct TokenKeys {
    access: SigningKey,
    refresh: SigningKey,
    issuer: String,
}

impl TokenKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            access: SigningKey::new(&cfg.access_secret, cfg.access_ttl),
            refresh: SigningKey::new(&cfg.refresh_secret, cfg.refresh_ttl),
            issuer: cfg.issuer.clone(),
        }
    }

    fn key(&self, kind: TokenKind) -> &SigningKey {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    fn sign_at(
        &self,
        subject: &Subject,
        kind: TokenKind,
        now: OffsetDateTime,
    ) -> anyhow::Result<String> {
        let key = self.key(kind);
        let exp = expires_at(now, key.ttl)
            .with_context(|| format!("{kind:?} token lifetime {:?} is out of range", key.ttl))?;
        let claims = Claims {
            sub: subject.id,
            username: subject.username.clone(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &key.encoding)?;
        debug!(user_id = %subject.id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    /// Both tokens carry the same subject claims and issue time.
    pub(crate) fn issue_pair_at(
        &self,
        subject: &Subject,
        now: OffsetDateTime,
    ) -> anyhow::Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.sign_at(subject, TokenKind::Access, now)?,
            refresh_token: self.sign_at(subject, TokenKind::Refresh, now)?,
        })
    }

    pub fn issue_pair(&self, subject: &Subject) -> anyhow::Result<TokenPair> {
        self.issue_pair_at(subject, OffsetDateTime::now_utc())
    }

    /// Checks signature, expiry (no leeway) and issuer against the key for `kind`.
    pub fn verify(&self, token: &str, kind: TokenKind) -> jsonwebtoken::errors::Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        let data = decode::<Claims>(token, &self.key(kind).decoding, &validation)?;
        debug!(user_id = %data.claims.sub, kind = ?kind, "jwt verified");
        Ok(data.claims)
    }
}

/// `now + ttl` in whole seconds, rounding a partial second up.
/// `None` when the result does not fit in `OffsetDateTime`.
fn expires_at(now: OffsetDateTime, ttl: Duration) -> Option<OffsetDateTime> {
    let secs = ttl.as_secs().checked_add(u64::from(ttl.subsec_nanos() > 0))?;
    let secs = i64::try_from(secs).ok()?;
    now.checked_add(TimeDuration::seconds(secs))
}
