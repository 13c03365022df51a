// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Explicit session issuance and removal.

use axum::http::HeaderMap;

use super::principal::Principal;
use super::transport::{write_removal, write_token, TransportError};
use crate::clock::Clock;
use crate::config::{Config, Transport};
use crate::token::{compose_for_id, TokenError};

/// Errors from [`login`] and [`logout`].
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    /// The token could not be composed (usually a bad signing key).
    #[error(transparent)]
    Token(#[from] TokenError),
    /// The token could not be written to the response.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Issue a token for `user` and write it on the configured transport.
///
/// Cookie mode appends a `Set-Cookie` carrying every configured attribute,
/// `Max-Age` set to the lifetime in whole seconds and `Expires` at now plus
/// the lifetime. Header mode sets `X-<session name>`.
///
/// # Errors
///
/// [`LoginError::Token`] when signing fails, [`LoginError::Transport`] when
/// the session name cannot be used as a response header.
pub fn login<P: Principal + ?Sized>(
    headers: &mut HeaderMap,
    config: &Config,
    clock: &dyn Clock,
    user: &P,
) -> Result<(), LoginError> {
    issue(headers, config, clock, user.id())
}

/// Issue a token for the identifier `id` and write it on the configured
/// transport.
pub(crate) fn issue(
    headers: &mut HeaderMap,
    config: &Config,
    clock: &dyn Clock,
    id: &str,
) -> Result<(), LoginError> {
    let token = compose_for_id(id, config, clock)?;
    write_token(headers, &token, config, clock)?;
    Ok(())
}

/// Tell the client to drop its session.
///
/// Cookie mode appends an immediately-expiring cookie. Header mode has
/// nothing to clear: the client simply stops sending the token.
///
/// # Errors
///
/// [`LoginError::Transport`] when the removal cookie cannot be encoded.
pub fn logout(headers: &mut HeaderMap, config: &Config) -> Result<(), LoginError> {
    if config.transport() == Transport::Cookie {
        write_removal(headers, config)?;
    }
    Ok(())
}
