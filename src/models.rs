// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Principal;

/// A user of the demo service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DemoUser {
    /// Login name, also the session identifier.
    pub username: String,
    pub display_name: String,
}

impl Principal for DemoUser {
    fn id(&self) -> &str {
        &self.username
    }
}

/// Credentials posted to `/login`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}
