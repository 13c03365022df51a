// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{env, net::SocketAddr};

use session_gate::{api::router, config::Config, state::AppState, store::UserDirectory};
use tracing_subscriber::EnvFilter;

/// Environment variable selecting the log format (`json` or `pretty`).
const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// `user:password[:Display Name]` entries, comma separated.
const DEMO_USERS_ENV: &str = "DEMO_USERS";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,session_gate=debug"));

    if env::var(LOG_FORMAT_ENV).as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn seed_users(users: &UserDirectory) {
    let entries = env::var(DEMO_USERS_ENV).unwrap_or_else(|_| "alice:wonderland:Alice".to_string());
    for entry in entries.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let mut fields = entry.splitn(3, ':');
        match (fields.next(), fields.next(), fields.next()) {
            (Some(name), Some(password), display) => {
                if let Err(e) = users.insert(name, display.unwrap_or(name), password).await {
                    tracing::warn!(error = %e, user = name, "Failed to seed demo user");
                }
            }
            _ => tracing::warn!(entry, "Ignoring malformed {DEMO_USERS_ENV} entry"),
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() {
    init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid session configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(?config, "Loaded session configuration");

    let users = UserDirectory::new();
    seed_users(&users).await;

    let app = router(AppState::new(config, users));

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    let addr: SocketAddr = match format!("{host}:{port}").parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(error = %e, %host, port, "Failed to parse bind address");
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "Failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "Session Gate demo listening");
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server failed");
    }
}
