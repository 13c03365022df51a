// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::principal::BoxError;
use crate::token::TokenError;

/// Message shown to unauthenticated callers, whatever the cause.
pub const NOT_AUTHORIZED: &str = "Not Authorized.";

/// Why a request could not be authenticated.
///
/// The detail is for logs only: every variant renders the same 401 body.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No cookie/header at the configured name.
    #[error("no session token at the configured transport")]
    TransportMissing,
    /// A token was presented but could not be trusted.
    #[error(transparent)]
    Token(#[from] TokenError),
    /// The token carries an empty identifier.
    #[error("token carries an empty identity")]
    EmptyIdentity,
    /// The application's lookup failed or found nobody.
    #[error("user lookup failed: {0}")]
    LookupFailed(#[source] BoxError),
    /// A handler asked for the principal but none was attached.
    #[error("no authenticated principal on this request")]
    NoPrincipal,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::TransportMissing => "transport_missing",
            AuthError::Token(e) => e.code(),
            AuthError::EmptyIdentity => "empty_identity",
            AuthError::LookupFailed(_) => "lookup_failed",
            AuthError::NoPrincipal => "no_principal",
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorMessage {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    errors: [ErrorMessage; 1],
}

/// The standard `401 {"errors":[{"message":"Not Authorized."}]}` response.
pub fn unauthorized() -> Response {
    let body = Json(ErrorBody {
        errors: [ErrorMessage {
            message: NOT_AUTHORIZED,
        }],
    });
    (StatusCode::UNAUTHORIZED, body).into_response()
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        unauthorized()
    }
}
