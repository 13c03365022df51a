// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{AuthError, LoginError};
use crate::config::ConfigError;
use crate::token::TokenError;

/// Any error this crate can produce.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Login(#[from] LoginError),
}

/// Error returned by the demo API handlers.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorMessage {
    pub message: String,
}

/// Error body shared by the 401 and the demo API errors.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub errors: Vec<ErrorMessage>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, crate::auth::error::NOT_AUTHORIZED)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<LoginError> for ApiError {
    fn from(e: LoginError) -> Self {
        tracing::error!(error = %e, "Failed to issue session");
        Self::internal("Failed to issue session")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            errors: vec![ErrorMessage {
                message: self.message,
            }],
        });
        (self.status, body).into_response()
    }
}
