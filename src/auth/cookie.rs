use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration as TimeDuration;

pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Cookie lifetime, independent of the refresh token's own `exp`.
pub const REFRESH_COOKIE_MAX_AGE: TimeDuration = TimeDuration::days(7);

/// Refresh-token cookie: http-only, same-site strict, scoped to the whole app.
pub fn refresh_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(REFRESH_COOKIE_MAX_AGE)
        .build()
}

/// Expired, empty cookie that makes the browser drop the refresh token.
pub fn clear_refresh_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(TimeDuration::ZERO)
        .build()
}

pub fn refresh_token_from(jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
