// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session Gate - Signed Session Tokens for Axum Services
//!
//! This crate issues compact signed session tokens, carries them in a cookie
//! or a header, and verifies them in request middleware that attaches the
//! authenticated user to the request and renews the token as it goes.
//! Sessions are stateless: everything lives in the token.
//!
//! ## Modules
//!
//! - `auth` - Middleware, extractors, login/logout
//! - `token` - Token codec and signing capability
//! - `config` - Session configuration
//! - `clock` - Injectable time source
//! - `api` - Demo HTTP API (Axum)

pub mod api;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
pub mod token;

pub use auth::{
    login, logout, populate_user, require_user, CurrentUser, FindUser, MaybeUser, Principal,
    SessionAuth,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, CookieOptions, SameSite, Transport};
pub use error::Error;
pub use token::{ClaimSet, Hs256Signer, Signer};
