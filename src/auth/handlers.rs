use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::instrument;

use crate::{
    auth::{
        cookie::{clear_refresh_cookie, refresh_cookie, refresh_token_from},
        dto::{LoginRequest, LoginResponse, RefreshResponse},
    },
    error::{AppError, AppResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let payload = payload.validate()?;
    let signed = state.auth.sign_in(&payload.username, &payload.password).await?;

    let cookie = refresh_cookie(signed.tokens.refresh_token, state.config.cookie_secure);
    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            user: signed.user,
            access_token: signed.tokens.access_token,
        }),
    ))
}

/// The refresh token is read from the cookie only, never from the body.
#[instrument(skip(state, jar))]
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<RefreshResponse>)> {
    let token = refresh_token_from(&jar).ok_or(AppError::InvalidOrExpiredToken)?;
    let tokens = state.auth.refresh(&token).await?;

    let cookie = refresh_cookie(tokens.refresh_token, state.config.cookie_secure);
    Ok((
        jar.add(cookie),
        Json(RefreshResponse {
            access_token: tokens.access_token,
        }),
    ))
}

#[instrument(skip(state, jar))]
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, StatusCode) {
    (
        jar.add(clear_refresh_cookie(state.config.cookie_secure)),
        StatusCode::NO_CONTENT,
    )
}
