use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::extractors::AuthUser,
    error::AppResult,
    state::AppState,
    users::dto::{CreateUserRequest, CreatedUserResponse, UserView},
};

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/user", get(list_users).post(create_user))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<CreatedUserResponse>)> {
    let input = payload.validate()?;
    let user = state.users.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedUserResponse {
            new_user: user.into(),
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> AppResult<Json<Vec<UserView>>> {
    let users = state.users.find_all().await?;
    info!(count = users.len(), "listed users");
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}
