// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Reading and writing the token on the configured transport.

use axum::http::{header::SET_COOKIE, HeaderMap, HeaderName, HeaderValue};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite as CookieSameSite};
use time::OffsetDateTime;

use super::AuthError;
use crate::clock::Clock;
use crate::config::{Config, CookieOptions, SameSite, Transport};
use crate::token::TokenError;

/// Failure to put a token on the response.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid response header name '{0}'")]
    HeaderName(String),
    #[error("token is not a valid header value")]
    HeaderValue,
}

/// Read the raw token from request headers.
///
/// Only the configured transport is looked at: a header-mode config never
/// sees cookies and vice versa.
pub(crate) fn read_token(headers: &HeaderMap, config: &Config) -> Result<String, AuthError> {
    let raw = match config.transport() {
        Transport::Header => match headers.get(config.session_name()) {
            Some(value) => value
                .to_str()
                .map_err(|_| TokenError::malformed("header value is not visible ASCII"))?
                .trim()
                .to_string(),
            None => return Err(AuthError::TransportMissing),
        },
        Transport::Cookie => CookieJar::from_headers(headers)
            .get(config.session_name())
            .map(|c| c.value().to_string())
            .ok_or(AuthError::TransportMissing)?,
    };

    if raw.is_empty() {
        return Err(AuthError::TransportMissing);
    }
    Ok(raw)
}

/// Put `token` on the response headers.
///
/// Cookie mode appends a `Set-Cookie` with the configured attributes,
/// `Max-Age` equal to the lifetime and `Expires` at now plus the lifetime.
/// Header mode sets `X-<session name>`.
pub(crate) fn write_token(
    headers: &mut HeaderMap,
    token: &str,
    config: &Config,
    clock: &dyn Clock,
) -> Result<(), TransportError> {
    match config.transport() {
        Transport::Header => {
            let name = config.response_header_name();
            let name = HeaderName::try_from(name.as_str())
                .map_err(|_| TransportError::HeaderName(name.clone()))?;
            let value = HeaderValue::from_str(token).map_err(|_| TransportError::HeaderValue)?;
            headers.insert(name, value);
        }
        Transport::Cookie => {
            let mut cookie = session_cookie(config, token.to_string());
            cookie.set_max_age(time::Duration::seconds(config.lifetime().num_seconds()));
            let expires = clock.now_secs() + config.lifetime().num_seconds();
            if let Ok(at) = OffsetDateTime::from_unix_timestamp(expires) {
                cookie.set_expires(at);
            }
            append_cookie(headers, &cookie)?;
        }
    }
    Ok(())
}

/// Append a cookie that makes the browser drop the session cookie.
pub(crate) fn write_removal(headers: &mut HeaderMap, config: &Config) -> Result<(), TransportError> {
    let mut cookie = session_cookie(config, String::new());
    cookie.set_max_age(time::Duration::ZERO);
    cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
    append_cookie(headers, &cookie)
}

fn session_cookie(config: &Config, value: String) -> Cookie<'static> {
    let options: &CookieOptions = config.cookie();
    let mut cookie = Cookie::new(config.session_name().to_string(), value);
    if !options.path.is_empty() {
        cookie.set_path(options.path.clone());
    }
    if !options.domain.is_empty() {
        cookie.set_domain(options.domain.clone());
    }
    cookie.set_secure(options.secure);
    cookie.set_http_only(options.http_only);
    cookie.set_same_site(match options.same_site {
        SameSite::Unset => None,
        SameSite::Lax => Some(CookieSameSite::Lax),
        SameSite::Strict => Some(CookieSameSite::Strict),
        SameSite::None => Some(CookieSameSite::None),
    });
    cookie
}

fn append_cookie(headers: &mut HeaderMap, cookie: &Cookie<'_>) -> Result<(), TransportError> {
    let value = HeaderValue::from_str(&cookie.to_string()).map_err(|_| TransportError::HeaderValue)?;
    headers.append(SET_COOKIE, value);
    Ok(())
}
