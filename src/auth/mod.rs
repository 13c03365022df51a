// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Session authentication for Axum services built on signed tokens.
//!
//! ## Auth Flow
//!
//! 1. The application calls [`login`] after checking credentials; the token
//!    goes out as a cookie or as an `X-<name>` response header
//! 2. The client sends the token back on every request
//! 3. The session middleware:
//!    - Reads the token from the configured cookie or header
//!    - Verifies signature, issued-at, expiry, audience, issuer, subject
//!    - Looks the user up through the application's [`FindUser`]
//!    - Attaches the user to the request extensions
//!    - Sends back a renewed token
//!
//! ## Failure Handling
//!
//! - [`require_user`] answers 401 `{"errors":[{"message":"Not Authorized."}]}`
//! - [`populate_user`] lets the request through without a user
//! - Details are logged with `tracing`, never sent to the client

pub mod error;
pub mod extractor;
pub mod login;
pub mod middleware;
pub mod principal;
pub mod transport;

pub use error::{unauthorized, AuthError};
pub use extractor::{current_user, CurrentUser, MaybeUser};
pub use login::{login, logout, LoginError};
pub use middleware::{populate_user, require_user, SessionAuth};
pub use principal::{BoxError, FindUser, Principal};
pub use transport::TransportError;
