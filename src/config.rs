// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Configuration
//!
//! [`Config`] bundles everything the token codec and the middleware need:
//! the signing capability, the expected claims, the token lifetime and the
//! transport (cookie or header) with its cookie attributes.
//!
//! A config is built once through [`Config::new`] (or [`Config::from_env`])
//! and shared read-only afterwards.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SESSION_NAME` | Cookie name, or header name in header mode | `session` |
//! | `SESSION_TRANSPORT` | `cookie` or `header` | `cookie` |
//! | `SESSION_SECRET` | HS256 signing secret | Required |
//! | `SESSION_AUDIENCE` | Expected `aud` claim | empty |
//! | `SESSION_ISSUER` | Expected `iss` claim | empty |
//! | `SESSION_SUBJECT` | Expected `sub` claim | empty |
//! | `SESSION_LIFETIME_SECS` | Token lifetime in seconds (`0` = default) | `0` |
//! | `SESSION_COOKIE_PATH` | Cookie `Path` | `/` |
//! | `SESSION_COOKIE_DOMAIN` | Cookie `Domain` | unset |
//! | `SESSION_COOKIE_SECURE` | Cookie `Secure` flag | `true` |
//! | `SESSION_COOKIE_HTTP_ONLY` | Cookie `HttpOnly` flag | `true` |
//! | `SESSION_COOKIE_SAME_SITE` | `lax`, `strict`, `none` or `unset` | `lax` |

use std::{fmt, str::FromStr, sync::Arc};

use chrono::Duration;

use crate::token::{Hs256Signer, Signer};

pub const SESSION_NAME_ENV: &str = "SESSION_NAME";
pub const SESSION_TRANSPORT_ENV: &str = "SESSION_TRANSPORT";
pub const SESSION_SECRET_ENV: &str = "SESSION_SECRET";
pub const SESSION_AUDIENCE_ENV: &str = "SESSION_AUDIENCE";
pub const SESSION_ISSUER_ENV: &str = "SESSION_ISSUER";
pub const SESSION_SUBJECT_ENV: &str = "SESSION_SUBJECT";
pub const SESSION_LIFETIME_ENV: &str = "SESSION_LIFETIME_SECS";
pub const SESSION_COOKIE_PATH_ENV: &str = "SESSION_COOKIE_PATH";
pub const SESSION_COOKIE_DOMAIN_ENV: &str = "SESSION_COOKIE_DOMAIN";
pub const SESSION_COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
pub const SESSION_COOKIE_HTTP_ONLY_ENV: &str = "SESSION_COOKIE_HTTP_ONLY";
pub const SESSION_COOKIE_SAME_SITE_ENV: &str = "SESSION_COOKIE_SAME_SITE";

/// Lifetime used when a config is built with a zero lifetime (60 hours).
pub const DEFAULT_LIFETIME_MINUTES: i64 = 3600;

/// The default token lifetime as a duration.
pub fn default_lifetime() -> Duration {
    Duration::minutes(DEFAULT_LIFETIME_MINUTES)
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Token lifetime was negative.
    #[error("lifetime must be zero or positive, got {0}")]
    InvalidLifetime(Duration),
    /// An environment variable was missing or unparseable.
    #[error("{0}")]
    Env(String),
}

/// Where the token travels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Transport {
    /// A cookie named after the session name.
    #[default]
    Cookie,
    /// A request header named after the session name; refreshed tokens go
    /// out in `X-<session name>`.
    Header,
}

impl FromStr for Transport {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cookie" => Ok(Transport::Cookie),
            "header" => Ok(Transport::Header),
            other => Err(ConfigError::Env(format!(
                "{SESSION_TRANSPORT_ENV}: unknown transport '{other}' (expected 'cookie' or 'header')"
            ))),
        }
    }
}

/// Cookie `SameSite` policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SameSite {
    /// Attribute is not emitted.
    #[default]
    Unset,
    Lax,
    Strict,
    None,
}

impl FromStr for SameSite {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" | "unset" | "default" => Ok(SameSite::Unset),
            "lax" => Ok(SameSite::Lax),
            "strict" => Ok(SameSite::Strict),
            "none" => Ok(SameSite::None),
            other => Err(ConfigError::Env(format!(
                "{SESSION_COOKIE_SAME_SITE_ENV}: unknown policy '{other}'"
            ))),
        }
    }
}

/// Attributes applied to the session cookie. Empty `path`/`domain` are not
/// emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: String,
    pub domain: String,
    /// Set when serving over HTTPS.
    pub secure: bool,
    /// Clear when the token must be readable from scripts.
    pub http_only: bool,
    pub same_site: SameSite,
}

/// Session configuration.
#[derive(Clone)]
pub struct Config {
    session_name: String,
    transport: Transport,
    signer: Arc<dyn Signer>,
    audience: String,
    issuer: String,
    subject: String,
    lifetime: Duration,
    cookie: CookieOptions,
}

impl Config {
    /// Build a config.
    ///
    /// A zero `lifetime` is replaced by [`default_lifetime`]. Audience,
    /// issuer and subject may be empty.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidLifetime`] when `lifetime` is negative.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        session_name: impl Into<String>,
        transport: Transport,
        signer: Arc<dyn Signer>,
        audience: impl Into<String>,
        issuer: impl Into<String>,
        subject: impl Into<String>,
        lifetime: Duration,
        cookie: CookieOptions,
    ) -> Result<Self, ConfigError> {
        if lifetime < Duration::zero() {
            return Err(ConfigError::InvalidLifetime(lifetime));
        }
        let lifetime = if lifetime.is_zero() {
            default_lifetime()
        } else {
            lifetime
        };

        Ok(Self {
            session_name: session_name.into(),
            transport,
            signer,
            audience: audience.into(),
            issuer: issuer.into(),
            subject: subject.into(),
            lifetime,
            cookie,
        })
    }

    /// Build a config from `SESSION_*` environment variables (HS256 only).
    ///
    /// # Errors
    ///
    /// [`ConfigError::Env`] when `SESSION_SECRET` is missing or a value does
    /// not parse; [`ConfigError::InvalidLifetime`] as for [`Config::new`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secret = get(SESSION_SECRET_ENV)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::Env(format!("{SESSION_SECRET_ENV} is required")))?;

        let transport = match get(SESSION_TRANSPORT_ENV) {
            Some(t) => t.parse()?,
            None => Transport::Cookie,
        };

        let lifetime = match get(SESSION_LIFETIME_ENV) {
            Some(secs) => {
                let secs = secs
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| ConfigError::Env(format!("{SESSION_LIFETIME_ENV}: {e}")))?;
                Duration::try_seconds(secs).ok_or_else(|| {
                    ConfigError::Env(format!("{SESSION_LIFETIME_ENV}: {secs} is out of range"))
                })?
            }
            None => Duration::zero(),
        };

        let cookie = CookieOptions {
            path: get(SESSION_COOKIE_PATH_ENV).unwrap_or_else(|| "/".to_string()),
            domain: get(SESSION_COOKIE_DOMAIN_ENV).unwrap_or_default(),
            secure: parse_flag(&get, SESSION_COOKIE_SECURE_ENV, true)?,
            http_only: parse_flag(&get, SESSION_COOKIE_HTTP_ONLY_ENV, true)?,
            same_site: match get(SESSION_COOKIE_SAME_SITE_ENV) {
                Some(s) => s.parse()?,
                None => SameSite::Lax,
            },
        };

        Self::new(
            get(SESSION_NAME_ENV).unwrap_or_else(|| "session".to_string()),
            transport,
            Arc::new(Hs256Signer::new(secret)),
            get(SESSION_AUDIENCE_ENV).unwrap_or_default(),
            get(SESSION_ISSUER_ENV).unwrap_or_default(),
            get(SESSION_SUBJECT_ENV).unwrap_or_default(),
            lifetime,
            cookie,
        )
    }

    /// Replace the signing capability (key rotation, tests).
    #[must_use]
    pub fn with_signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = signer;
        self
    }

    /// Cookie name or header name.
    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    pub fn signer(&self) -> &dyn Signer {
        self.signer.as_ref()
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Token lifetime; always positive.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    pub fn cookie(&self) -> &CookieOptions {
        &self.cookie
    }

    /// Name of the response header carrying refreshed tokens in header mode.
    pub fn response_header_name(&self) -> String {
        format!("X-{}", self.session_name)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("session_name", &self.session_name)
            .field("transport", &self.transport)
            .field("algorithm", &self.signer.algorithm())
            .field("audience", &self.audience)
            .field("issuer", &self.issuer)
            .field("subject", &self.subject)
            .field("lifetime", &self.lifetime)
            .field("cookie", &self.cookie)
            .finish()
    }
}

fn parse_flag(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: bool,
) -> Result<bool, ConfigError> {
    match get(key).as_deref().map(str::to_lowercase).as_deref() {
        None => Ok(default),
        Some("1") | Some("true") | Some("yes") => Ok(true),
        Some("0") | Some("false") | Some("no") => Ok(false),
        Some(other) => Err(ConfigError::Env(format!("{key}: expected a boolean, got '{other}'"))),
    }
}
