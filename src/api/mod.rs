// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{populate_user, require_user},
    error::{ErrorBody, ErrorMessage},
    models::{DemoUser, LoginRequest},
    state::AppState,
    store::UserDirectory,
};

pub mod health;
pub mod session;

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/me", get(session::me))
        .route_layer(from_fn_with_state(
            state.auth.clone(),
            require_user::<UserDirectory>,
        ));

    let optional = Router::new()
        .route("/whoami", get(session::whoami))
        .route_layer(from_fn_with_state(
            state.auth.clone(),
            populate_user::<UserDirectory>,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/login", post(session::login))
        .route("/logout", post(session::logout))
        .merge(protected)
        .merge(optional)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        session::login,
        session::logout,
        session::me,
        session::whoami
    ),
    components(schemas(DemoUser, LoginRequest, ErrorBody, ErrorMessage)),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Session", description = "Login, logout and the current user")
    )
)]
struct ApiDoc;
