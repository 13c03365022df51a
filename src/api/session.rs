// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::{
    auth::{self, CurrentUser, MaybeUser},
    error::{ApiError, ErrorBody},
    models::{DemoUser, LoginRequest},
    state::AppState,
};

/// Check the password and open a session.
#[utoipa::path(
    post,
    path = "/login",
    tag = "Session",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued on the configured transport", body = DemoUser),
        (status = 401, description = "Unknown user or wrong password", body = ErrorBody),
        (status = 500, description = "Token could not be issued", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<DemoUser>), ApiError> {
    let user = state
        .users()
        .verify(&request.username, &request.password)
        .await
        .ok_or_else(|| {
            tracing::info!(username = %request.username, "Rejected login");
            ApiError::unauthorized()
        })?;

    let mut headers = HeaderMap::new();
    state.auth.login(&mut headers, &user)?;
    tracing::info!(username = %user.username, "Session issued");
    Ok((headers, Json(user)))
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Session",
    responses(
        (status = 204, description = "Session cookie cleared"),
        (status = 500, description = "Removal cookie could not be written", body = ErrorBody)
    )
)]
pub async fn logout(State(state): State<AppState>) -> Result<(HeaderMap, StatusCode), ApiError> {
    let mut headers = HeaderMap::new();
    auth::logout(&mut headers, state.auth.config())?;
    Ok((headers, StatusCode::NO_CONTENT))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = "Session",
    responses(
        (status = 200, description = "The authenticated user", body = DemoUser),
        (status = 401, description = "No valid session", body = ErrorBody)
    )
)]
pub async fn me(CurrentUser(user): CurrentUser<DemoUser>) -> Json<DemoUser> {
    Json(user)
}

#[utoipa::path(
    get,
    path = "/whoami",
    tag = "Session",
    responses(
        (status = 200, description = "The authenticated user, or null", body = Option<DemoUser>)
    )
)]
pub async fn whoami(MaybeUser(user): MaybeUser<DemoUser>) -> Json<Option<DemoUser>> {
    Json(user)
}
