use std::time::Duration;

use anyhow::{bail, Context};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

/// Signing material and lifetimes for the two token kinds.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub access_secret: String,
    pub access_ttl: Duration,
    pub refresh_secret: String,
    pub refresh_ttl: Duration,
    pub issuer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreKind,
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = match get("STORE").as_deref().map(str::trim) {
            None | Some("") | Some("postgres") => StoreKind::Postgres,
            Some("memory") => StoreKind::Memory,
            Some(other) => bail!("STORE must be `postgres` or `memory`, got `{other}`"),
        };

        let database_url = get("DATABASE_URL");
        if store == StoreKind::Postgres && database_url.is_none() {
            bail!("DATABASE_URL is required when STORE=postgres");
        }

        let jwt = JwtConfig {
            access_secret: get("JWT_SECRET").context("JWT_SECRET is not set")?,
            access_ttl: parse_duration(&get("JWT_EXPIRES_IN").unwrap_or_else(|| "15m".into()))
                .context("JWT_EXPIRES_IN")?,
            refresh_secret: get("REFRESH_SECRET").context("REFRESH_SECRET is not set")?,
            refresh_ttl: parse_duration(
                &get("REFRESH_EXPIRES_IN").unwrap_or_else(|| "7d".into()),
            )
            .context("REFRESH_EXPIRES_IN")?,
            issuer: get("JWT_ISSUER").unwrap_or_else(|| "authgate".into()),
        };
        jwt.validate()?;

        let cookie_secure = get("COOKIE_SECURE")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            store,
            database_url,
            jwt,
            cookie_secure,
        })
    }
}

impl JwtConfig {
    pub const MIN_TTL: Duration = Duration::from_secs(1);
    /// 3650 days.
    pub const MAX_TTL: Duration = Duration::from_secs(3650 * 24 * 60 * 60);

    /// A leaked access secret must not be able to mint refresh tokens.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.access_secret.is_empty() || self.refresh_secret.is_empty() {
            bail!("JWT_SECRET and REFRESH_SECRET must be non-empty");
        }
        if self.access_secret == self.refresh_secret {
            bail!("JWT_SECRET and REFRESH_SECRET must differ");
        }
        for (name, ttl) in [
            ("JWT_EXPIRES_IN", self.access_ttl),
            ("REFRESH_EXPIRES_IN", self.refresh_ttl),
        ] {
            if !(Self::MIN_TTL..=Self::MAX_TTL).contains(&ttl) {
                bail!("{name} must be between 1s and 3650d, got {ttl:?}");
            }
        }
        Ok(())
    }
}

/// Parses `60s`, `15m`, `7d` style lifetimes. A bare number is seconds.
pub fn parse_duration(raw: &str) -> anyhow::Result<Duration> {
    lazy_static! {
        static ref DURATION_RE: Regex = Regex::new(r"^(\d+)\s*(ms|s|m|h|d|w)?$").unwrap();
    }
    let raw = raw.trim();
    let caps = DURATION_RE
        .captures(raw)
        .with_context(|| format!("invalid duration `{raw}`"))?;
    let amount: u64 = caps[1]
        .parse()
        .with_context(|| format!("invalid duration `{raw}`"))?;
    let unit_secs = match caps.get(2).map(|m| m.as_str()) {
        Some("ms") => return non_zero(Duration::from_millis(amount), raw),
        None | Some("s") => 1,
        Some("m") => 60,
        Some("h") => 60 * 60,
        Some("d") => 24 * 60 * 60,
        Some("w") => 7 * 24 * 60 * 60,
        Some(other) => bail!("unknown duration unit `{other}`"),
    };
    let secs = amount
        .checked_mul(unit_secs)
        .with_context(|| format!("duration `{raw}` overflows"))?;
    non_zero(Duration::from_secs(secs), raw)
}

fn non_zero(d: Duration, raw: &str) -> anyhow::Result<Duration> {
    if d.is_zero() {
        bail!("duration `{raw}` must be greater than zero");
    }
    Ok(d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn parses_duration_units() {
        assert_eq!(parse_duration("60s").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(604_800));
        assert_eq!(parse_duration("1w").unwrap(), Duration::from_secs(604_800));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration(" 30 ").unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn rejects_bad_durations() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("soon").is_err());
        assert!(parse_duration("10y").is_err());
        assert!(parse_duration("-5s").is_err());
        assert!(parse_duration("0s").is_err());
    }

    #[test]
    fn loads_with_defaults() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/auth"),
            ("JWT_SECRET", "access"),
            ("REFRESH_SECRET", "refresh"),
        ]))
        .expect("config loads");
        assert_eq!(cfg.store, StoreKind::Postgres);
        assert_eq!(cfg.jwt.access_ttl, Duration::from_secs(15 * 60));
        assert_eq!(cfg.jwt.refresh_ttl, Duration::from_secs(7 * 24 * 60 * 60));
        assert_eq!(cfg.jwt.issuer, "authgate");
        assert!(!cfg.cookie_secure);
    }

    #[test]
    fn rejects_shared_secret() {
        let err = AppConfig::from_lookup(lookup(&[
            ("STORE", "memory"),
            ("JWT_SECRET", "same"),
            ("REFRESH_SECRET", "same"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn token_lifetimes_are_bounded() {
        let load = |access: &str, refresh: &str| {
            AppConfig::from_lookup(lookup(&[
                ("STORE", "memory"),
                ("JWT_SECRET", "a"),
                ("REFRESH_SECRET", "b"),
                ("JWT_EXPIRES_IN", access),
                ("REFRESH_EXPIRES_IN", refresh),
            ]))
        };
        assert!(load("1s", "3650d").is_ok());
        assert!(load("1000ms", "7d").is_ok());

        let err = load("900ms", "7d").unwrap_err();
        assert!(err.to_string().contains("JWT_EXPIRES_IN"));
        let err = load("15m", "3651d").unwrap_err();
        assert!(err.to_string().contains("REFRESH_EXPIRES_IN"));
        assert!(load("15m", "1000000000d").is_err());
    }

    #[test]
    fn postgres_store_requires_database_url() {
        let err = AppConfig::from_lookup(lookup(&[
            ("JWT_SECRET", "a"),
            ("REFRESH_SECRET", "b"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn memory_store_needs_no_database() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("STORE", "memory"),
            ("JWT_SECRET", "a"),
            ("REFRESH_SECRET", "b"),
            ("JWT_EXPIRES_IN", "60s"),
            ("COOKIE_SECURE", "true"),
        ]))
        .expect("config loads");
        assert_eq!(cfg.store, StoreKind::Memory);
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.jwt.access_ttl, Duration::from_secs(60));
        assert!(cfg.cookie_secure);
    }
}
