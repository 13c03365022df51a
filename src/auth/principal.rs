// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! What the application supplies: a user type and a way to find one.

use std::future::Future;

/// Opaque error returned by a user lookup.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A user type that can be put in a session.
pub trait Principal {
    /// Stable identifier stored in the token. Must be non-empty for an
    /// authenticated user.
    fn id(&self) -> &str;
}

/// Consumer-provided user lookup.
///
/// The implementing value is the lookup's context (a database pool, a
/// repository handle...). It is called once per authenticated request, so
/// it must be safe to call concurrently.
///
/// # Example
///
/// ```rust,ignore
/// impl FindUser for UserRepo {
///     type User = User;
///
///     async fn find_user(&self, id: &str) -> Result<User, BoxError> {
///         self.db.user_by_name(id).await?.ok_or_else(|| "no such user".into())
///     }
/// }
/// ```
pub trait FindUser: Send + Sync + 'static {
    /// The principal type attached to requests.
    type User: Principal + Clone + Send + Sync + 'static;

    /// Look up the user for `id`. Any error means "not authenticated"; the
    /// cause is only logged.
    fn find_user(&self, id: &str) -> impl Future<Output = Result<Self::User, BoxError>> + Send;
}
