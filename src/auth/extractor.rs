// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the principal attached by the session middleware.
//!
//! ```rust,ignore
//! async fn me(CurrentUser(user): CurrentUser<User>) -> impl IntoResponse {
//!     Json(user)
//! }
//!
//! async fn home(MaybeUser(user): MaybeUser<User>) -> impl IntoResponse {
//!     match user {
//!         Some(u) => format!("Hello, {}", u.name),
//!         None => "Hello, guest".to_string(),
//!     }
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, Extensions},
};

use super::AuthError;

/// Request-scoped slot holding the authenticated principal.
///
/// Private so that application values of the same type stored in the
/// request extensions can never be mistaken for the session's principal.
#[derive(Clone)]
pub(crate) struct Authenticated<P>(pub(crate) P);

/// Borrow the principal attached to a request, if any.
pub fn current_user<P: Send + Sync + 'static>(extensions: &Extensions) -> Option<&P> {
    extensions.get::<Authenticated<P>>().map(|a| &a.0)
}

/// Extractor for the authenticated principal.
///
/// Rejects with the standard 401 when the middleware did not attach one.
pub struct CurrentUser<P>(pub P);

impl<S, P> FromRequestParts<S> for CurrentUser<P>
where
    S: Send + Sync,
    P: Clone + Send + Sync + 'static,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user::<P>(&parts.extensions)
            .cloned()
            .map(CurrentUser)
            .ok_or(AuthError::NoPrincipal)
    }
}

/// Optional authentication extractor.
///
/// Yields `None` instead of rejecting when no principal is attached.
pub struct MaybeUser<P>(pub Option<P>);

impl<S, P> FromRequestParts<S> for MaybeUser<P>
where
    S: Send + Sync,
    P: Clone + Send + Sync + 'static,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(current_user::<P>(&parts.extensions).cloned()))
    }
}
