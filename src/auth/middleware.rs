// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session middleware for Axum.
//!
//! Each request goes through the same steps: read the token from the
//! configured transport, verify it, reject an empty identifier, look the
//! user up, attach the user to the request and, when renewal is on, send a
//! fresh token back on the same transport.
//!
//! Two entry points share those steps:
//!
//! - [`populate_user`] lets unauthenticated requests through with no
//!   principal attached.
//! - [`require_user`] answers the standard 401 and never runs the handler.
//!
//! # Usage
//!
//! ```rust,ignore
//! let auth = SessionAuth::new(config, user_repo);
//!
//! let app = Router::new()
//!     .route("/me", get(me))
//!     .route_layer(axum::middleware::from_fn_with_state(
//!         auth.clone(),
//!         require_user::<UserRepo>,
//!     ));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::SET_COOKIE, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::extractor::Authenticated;
use super::login::{issue, login, LoginError};
use super::principal::FindUser;
use super::transport::read_token;
use super::AuthError;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::token;

/// Middleware state: configuration, user lookup and clock.
pub struct SessionAuth<L> {
    config: Arc<Config>,
    lookup: Arc<L>,
    clock: Arc<dyn Clock>,
    renew: bool,
}

// Manual Clone: avoid derive adding an `L: Clone` bound.
impl<L> Clone for SessionAuth<L> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            lookup: self.lookup.clone(),
            clock: self.clock.clone(),
            renew: self.renew,
        }
    }
}

impl<L: FindUser> SessionAuth<L> {
    /// Create the middleware state with the system clock and renewal on.
    pub fn new(config: Config, lookup: L) -> Self {
        Self {
            config: Arc::new(config),
            lookup: Arc::new(lookup),
            clock: Arc::new(SystemClock),
            renew: true,
        }
    }

    /// Use another time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Turn token renewal on successful requests on or off.
    #[must_use]
    pub fn with_renewal(mut self, renew: bool) -> Self {
        self.renew = renew;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Resolve the user behind the token carried by `headers`.
    ///
    /// # Errors
    ///
    /// - [`AuthError::TransportMissing`] when no token is presented
    /// - [`AuthError::Token`] when the token does not verify
    /// - [`AuthError::EmptyIdentity`] when the token names nobody
    /// - [`AuthError::LookupFailed`] when the lookup fails
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<L::User, AuthError> {
        self.resolve(headers).await.map(|(_, user)| user)
    }

    // Returns the token's identifier along with the user: renewal must carry
    // the identifier forward, whatever `id()` the lookup's user reports.
    async fn resolve(&self, headers: &HeaderMap) -> Result<(String, L::User), AuthError> {
        let raw = read_token(headers, &self.config)?;
        let claims = token::extract(&raw, &self.config, self.clock.as_ref())?;
        if claims.id.is_empty() {
            return Err(AuthError::EmptyIdentity);
        }
        let user = self
            .lookup
            .find_user(&claims.id)
            .await
            .map_err(AuthError::LookupFailed)?;
        Ok((claims.id, user))
    }

    /// Issue a session for `user` onto `headers`.
    ///
    /// # Errors
    ///
    /// See [`login`].
    pub fn login(&self, headers: &mut HeaderMap, user: &L::User) -> Result<(), LoginError> {
        login(headers, &self.config, self.clock.as_ref(), user)
    }
}

/// Attach the user when the request carries a valid session, otherwise
/// continue without one.
///
/// A token with an empty identifier is treated the same as no token.
pub async fn populate_user<L: FindUser>(
    State(auth): State<SessionAuth<L>>,
    request: Request,
    next: Next,
) -> Response {
    run(auth, request, next, false).await
}

/// Attach the user or answer 401 without running the handler.
pub async fn require_user<L: FindUser>(
    State(auth): State<SessionAuth<L>>,
    request: Request,
    next: Next,
) -> Response {
    run(auth, request, next, true).await
}

async fn run<L: FindUser>(
    auth: SessionAuth<L>,
    request: Request,
    next: Next,
    required: bool,
) -> Response {
    // The body is not `Sync`; only the head is held across the lookup.
    let (mut parts, body) = request.into_parts();

    let (id, user) = match auth.resolve(&parts.headers).await {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::debug!(
                error = %e,
                code = e.error_code(),
                path = %parts.uri.path(),
                required,
                "Session authentication failed"
            );
            if required {
                return e.into_response();
            }
            return next.run(Request::from_parts(parts, body)).await;
        }
    };

    let refreshed = if auth.renew {
        renew(&auth, &id)
    } else {
        None
    };

    parts.extensions.insert(Authenticated(user));
    let mut response = next.run(Request::from_parts(parts, body)).await;

    if let Some(refreshed) = refreshed {
        merge_refreshed(response.headers_mut(), refreshed);
    }
    response
}

/// Compose the refreshed token for the incoming token's identifier.
/// Failures are logged, never returned: the request is already
/// authenticated by the incoming token.
fn renew<L: FindUser>(auth: &SessionAuth<L>, id: &str) -> Option<HeaderMap> {
    let mut headers = HeaderMap::new();
    match issue(&mut headers, &auth.config, auth.clock.as_ref(), id) {
        Ok(()) => Some(headers),
        Err(e) => {
            tracing::warn!(
                error = %e,
                user_id = id,
                "Failed to renew session token"
            );
            None
        }
    }
}

// Values set by the handler win: its cookies are kept after ours, its
// headers are left alone.
fn merge_refreshed(response: &mut HeaderMap, refreshed: HeaderMap) {
    for name in refreshed.keys() {
        if *name == SET_COOKIE {
            let existing: Vec<_> = response.get_all(name).iter().cloned().collect();
            response.remove(name);
            for value in refreshed.get_all(name).iter().chain(existing.iter()) {
                response.append(name.clone(), value.clone());
            }
        } else if !response.contains_key(name) {
            for value in refreshed.get_all(name) {
                response.append(name.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header::COOKIE, HeaderValue, Request as HttpRequest, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Json, Router,
    };
    use axum_extra::extract::cookie::Cookie;
    use chrono::{DateTime, Duration};
    use serde::Serialize;
    use tower::ServiceExt;

    use super::*;
    use crate::auth::{principal::BoxError, MaybeUser, Principal};
    use crate::clock::ManualClock;
    use crate::config::{CookieOptions, SameSite, Transport};
    use crate::token::{compose, ClaimSet, Hs256Signer};

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct User {
        username: String,
    }

    impl Principal for User {
        fn id(&self) -> &str {
            &self.username
        }
    }

    struct Directory {
        fail: bool,
    }

    impl FindUser for Directory {
        type User = User;

        async fn find_user(&self, id: &str) -> Result<User, BoxError> {
            if self.fail {
                return Err("Error Test".into());
            }
            Ok(User {
                username: id.to_string(),
            })
        }
    }

    async fn whoami(MaybeUser(user): MaybeUser<User>) -> Json<Option<User>> {
        Json(user)
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ))
    }

    fn config(transport: Transport, name: &str) -> Config {
        Config::new(
            name,
            transport,
            Arc::new(Hs256Signer::new("test")),
            "Test Audience",
            "Test Issuer",
            "Test Subject",
            Duration::hours(3600),
            CookieOptions {
                path: "/".into(),
                domain: "localhost".into(),
                secure: true,
                http_only: false,
                same_site: SameSite::Lax,
            },
        )
        .unwrap()
    }

    fn app(auth: SessionAuth<Directory>, required: bool) -> Router {
        let router = Router::new().route("/", get(whoami));
        if required {
            router.route_layer(from_fn_with_state(auth, require_user::<Directory>))
        } else {
            router.route_layer(from_fn_with_state(auth, populate_user::<Directory>))
        }
    }

    fn issue_token(config: &Config, clock: &ManualClock, username: &str, exp_diff: Duration) -> String {
        let now = clock.now_secs();
        compose(
            &ClaimSet {
                issuer: config.issuer().into(),
                subject: config.subject().into(),
                audience: config.audience().into(),
                expires_at: now + exp_diff.num_seconds(),
                not_before: now,
                issued_at: now,
                id: username.into(),
            },
            config.signer(),
            clock,
        )
        .unwrap()
    }

    fn with_cookie(name: &str, value: &str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .uri("/")
            .header(COOKIE, format!("{name}={value}"))
            .body(Body::empty())
            .unwrap()
    }

    fn with_header(name: &str, value: &str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .uri("/")
            .header(name, value)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn session_cookie(response: &Response, name: &str) -> Option<Cookie<'static>> {
        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| Cookie::parse(v.to_str().ok()?.to_string()).ok())
            .find(|c| c.name() == name)
    }

    struct Case {
        username: &'static str,
        exp_diff: Duration,
        fail_lookup: bool,
        cookie_name: &'static str,
        authenticated: bool,
    }

    fn cases() -> Vec<(&'static str, Case)> {
        vec![
            (
                "token in the cookie",
                Case {
                    username: "test_username",
                    exp_diff: Duration::hours(2),
                    fail_lookup: false,
                    cookie_name: "session",
                    authenticated: true,
                },
            ),
            (
                "token in a different cookie",
                Case {
                    username: "test_username",
                    exp_diff: Duration::hours(2),
                    fail_lookup: false,
                    cookie_name: "auth",
                    authenticated: false,
                },
            ),
            (
                "empty identifier",
                Case {
                    username: "",
                    exp_diff: Duration::hours(2),
                    fail_lookup: false,
                    cookie_name: "session",
                    authenticated: false,
                },
            ),
            (
                "expired token",
                Case {
                    username: "test_username",
                    exp_diff: Duration::hours(-2),
                    fail_lookup: false,
                    cookie_name: "session",
                    authenticated: false,
                },
            ),
            (
                "lookup fails",
                Case {
                    username: "test_username",
                    exp_diff: Duration::hours(2),
                    fail_lookup: true,
                    cookie_name: "session",
                    authenticated: false,
                },
            ),
        ]
    }

    #[tokio::test]
    async fn cookie_populate_user() {
        for (name, case) in cases() {
            let clock = clock();
            let config = config(Transport::Cookie, "session");
            let token = issue_token(&config, &clock, case.username, case.exp_diff);
            let auth = SessionAuth::new(config.clone(), Directory { fail: case.fail_lookup })
                .with_clock(clock.clone());

            let response = app(auth, false)
                .oneshot(with_cookie(case.cookie_name, &token))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK, "{name}");
            let refreshed = session_cookie(&response, "session");
            assert_eq!(refreshed.is_some(), case.authenticated, "{name}");

            let body = body_json(response).await;
            if case.authenticated {
                assert_eq!(body["username"], case.username, "{name}");
            } else {
                assert!(body.is_null(), "{name}");
            }
        }
    }

    #[tokio::test]
    async fn cookie_require_user() {
        for (name, case) in cases() {
            let clock = clock();
            let config = config(Transport::Cookie, "session");
            let token = issue_token(&config, &clock, case.username, case.exp_diff);
            let auth = SessionAuth::new(config.clone(), Directory { fail: case.fail_lookup })
                .with_clock(clock.clone());

            let response = app(auth, true)
                .oneshot(with_cookie(case.cookie_name, &token))
                .await
                .unwrap();

            let refreshed = session_cookie(&response, "session");
            assert_eq!(refreshed.is_some(), case.authenticated, "{name}");
            if case.authenticated {
                assert_eq!(response.status(), StatusCode::OK, "{name}");
                assert_eq!(body_json(response).await["username"], case.username);
            } else {
                assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{name}");
                assert_eq!(
                    body_json(response).await,
                    serde_json::json!({"errors": [{"message": "Not Authorized."}]}),
                    "{name}"
                );
            }
        }
    }

    #[tokio::test]
    async fn header_require_user() {
        for (name, case) in cases() {
            let clock = clock();
            let config = config(Transport::Header, "Authorization");
            let token = issue_token(&config, &clock, case.username, case.exp_diff);
            let auth = SessionAuth::new(config.clone(), Directory { fail: case.fail_lookup })
                .with_clock(clock.clone());

            // Headers have no "different cookie" equivalent; reuse the name.
            let header = if case.cookie_name == "session" {
                "Authorization"
            } else {
                "X-Other"
            };
            let response = app(auth, true)
                .oneshot(with_header(header, &token))
                .await
                .unwrap();

            assert!(response.headers().get(SET_COOKIE).is_none(), "{name}");
            assert_eq!(
                response.headers().contains_key("x-authorization"),
                case.authenticated,
                "{name}"
            );
            let expected = if case.authenticated {
                StatusCode::OK
            } else {
                StatusCode::UNAUTHORIZED
            };
            assert_eq!(response.status(), expected, "{name}");
        }
    }

    #[tokio::test]
    async fn header_populate_user() {
        for (name, case) in cases() {
            let clock = clock();
            let config = config(Transport::Header, "Authorization");
            let token = issue_token(&config, &clock, case.username, case.exp_diff);
            let auth = SessionAuth::new(config.clone(), Directory { fail: case.fail_lookup })
                .with_clock(clock.clone());

            let header = if case.cookie_name == "session" {
                "Authorization"
            } else {
                "X-Other"
            };
            let response = app(auth, false)
                .oneshot(with_header(header, &token))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK, "{name}");
            let body = body_json(response).await;
            if case.authenticated {
                assert_eq!(body["username"], case.username, "{name}");
            } else {
                assert!(body.is_null(), "{name}");
            }
        }
    }

    #[tokio::test]
    async fn header_mode_ignores_cookie_token() {
        let clock = clock();
        let config = config(Transport::Header, "session");
        let token = issue_token(&config, &clock, "test_username", Duration::hours(2));
        let auth = SessionAuth::new(config, Directory { fail: false }).with_clock(clock.clone());

        let response = app(auth, true)
            .oneshot(with_cookie("session", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn cookie_mode_ignores_header_token() {
        let clock = clock();
        let config = config(Transport::Cookie, "session");
        let token = issue_token(&config, &clock, "test_username", Duration::hours(2));
        let auth = SessionAuth::new(config, Directory { fail: false }).with_clock(clock.clone());

        let response = app(auth.clone(), true)
            .oneshot(with_header("session", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app(auth, false)
            .oneshot(with_header("session", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await.is_null());
    }

    #[tokio::test]
    async fn refreshed_cookie_expires_a_lifetime_from_now() {
        let clock = clock();
        let config = config(Transport::Cookie, "session");
        let token = issue_token(&config, &clock, "test_username", Duration::hours(2));
        let auth = SessionAuth::new(config.clone(), Directory { fail: false })
            .with_clock(clock.clone());

        clock.advance(Duration::minutes(30));
        let response = app(auth, false)
            .oneshot(with_cookie("session", &token))
            .await
            .unwrap();

        let cookie = session_cookie(&response, "session").unwrap();
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), Some("localhost"));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(3600)));

        let claims = token::extract(cookie.value(), &config, &*clock).unwrap();
        assert_eq!(claims.id, "test_username");
        assert_eq!(claims.expires_at, clock.now_secs() + 3600 * 3600);
    }

    #[tokio::test]
    async fn refreshed_header_token_is_valid() {
        let clock = clock();
        let config = config(Transport::Header, "Authorization");
        let token = issue_token(&config, &clock, "test_username", Duration::hours(2));
        let auth = SessionAuth::new(config.clone(), Directory { fail: false })
            .with_clock(clock.clone());

        let response = app(auth, true)
            .oneshot(with_header("Authorization", &token))
            .await
            .unwrap();
        let refreshed = response.headers()["X-Authorization"].to_str().unwrap();
        let claims = token::extract(refreshed, &config, &*clock).unwrap();
        assert_eq!(claims.id, "test_username");
        assert_eq!(claims.expires_at, clock.now_secs() + 3600 * 3600);
    }

    #[tokio::test]
    async fn renewal_keeps_token_identifier() {
        #[derive(Clone)]
        struct Canonical(String);

        impl Principal for Canonical {
            fn id(&self) -> &str {
                &self.0
            }
        }

        struct Uppercase;

        impl FindUser for Uppercase {
            type User = Canonical;

            async fn find_user(&self, id: &str) -> Result<Canonical, BoxError> {
                Ok(Canonical(id.to_uppercase()))
            }
        }

        let clock = clock();
        let config = config(Transport::Header, "Authorization");
        let token = issue_token(&config, &clock, "alice", Duration::hours(2));
        let auth = SessionAuth::new(config.clone(), Uppercase).with_clock(clock.clone());

        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .route_layer(from_fn_with_state(auth, require_user::<Uppercase>));
        let response = app
            .oneshot(with_header("Authorization", &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let refreshed = response.headers()["X-Authorization"].to_str().unwrap();
        let claims = token::extract(refreshed, &config, &*clock).unwrap();
        assert_eq!(claims.id, "alice");
    }

    #[tokio::test]
    async fn renewal_can_be_disabled() {
        let clock = clock();
        let config = config(Transport::Cookie, "session");
        let token = issue_token(&config, &clock, "test_username", Duration::hours(2));
        let auth = SessionAuth::new(config, Directory { fail: false })
            .with_clock(clock.clone())
            .with_renewal(false);

        let response = app(auth, true)
            .oneshot(with_cookie("session", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(SET_COOKIE).is_none());
        assert_eq!(body_json(response).await["username"], "test_username");
    }

    #[tokio::test]
    async fn renewal_failure_does_not_fail_request() {
        let clock = clock();
        let config = config(Transport::Cookie, "session");
        let token = issue_token(&config, &clock, "test_username", Duration::hours(2));

        // Accepts incoming tokens but cannot sign new ones.
        struct VerifyOnly(Hs256Signer);
        impl crate::token::Signer for VerifyOnly {
            fn algorithm(&self) -> &'static str {
                "HS256"
            }
            fn sign(&self, _: &[u8]) -> Result<Vec<u8>, crate::token::SignerError> {
                Err(crate::token::SignerError::EmptyKey)
            }
            fn verify(&self, p: &[u8], s: &[u8]) -> Result<(), crate::token::SignerError> {
                self.0.verify(p, s)
            }
        }
        let config = config.with_signer(Arc::new(VerifyOnly(Hs256Signer::new("test"))));
        let auth = SessionAuth::new(config, Directory { fail: false }).with_clock(clock.clone());

        let response = app(auth, true)
            .oneshot(with_cookie("session", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(SET_COOKIE).is_none());
        assert_eq!(body_json(response).await["username"], "test_username");
    }

    #[tokio::test]
    async fn required_mode_never_runs_handler() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let called = Arc::new(AtomicBool::new(false));
        let flag = called.clone();
        let auth = SessionAuth::new(config(Transport::Cookie, "session"), Directory { fail: false })
            .with_clock(clock());
        let app = Router::new()
            .route(
                "/",
                get(move || async move {
                    flag.store(true, Ordering::SeqCst);
                    "ok"
                }),
            )
            .route_layer(from_fn_with_state(auth, require_user::<Directory>));

        let request = HttpRequest::builder().uri("/").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn handler_cookies_come_after_refresh() {
        let mut response = HeaderMap::new();
        response.append(SET_COOKIE, HeaderValue::from_static("session=; Max-Age=0"));
        response.insert("x-session", HeaderValue::from_static("from-handler"));

        let mut refreshed = HeaderMap::new();
        refreshed.append(SET_COOKIE, HeaderValue::from_static("session=new"));
        refreshed.insert("x-session", HeaderValue::from_static("from-refresh"));

        merge_refreshed(&mut response, refreshed);
        let cookies: Vec<_> = response.get_all(SET_COOKIE).iter().collect();
        assert_eq!(cookies, ["session=new", "session=; Max-Age=0"]);
        assert_eq!(response["x-session"], "from-handler");
    }
}
