// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::SessionAuth;
use crate::clock::Clock;
use crate::config::Config;
use crate::store::UserDirectory;

pub type DemoAuth = SessionAuth<UserDirectory>;

#[derive(Clone)]
pub struct AppState {
    pub auth: DemoAuth,
}

impl AppState {
    pub fn new(config: Config, users: UserDirectory) -> Self {
        Self {
            auth: SessionAuth::new(config, users),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.auth = self.auth.with_clock(clock);
        self
    }

    pub fn users(&self) -> &UserDirectory {
        self.auth.lookup()
    }
}
