// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory user directory backing the demo service.
//!
//! Passwords are kept as salted Argon2 PHC strings. Real deployments plug
//! their own [`FindUser`].

use std::collections::HashMap;

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use tokio::sync::RwLock;

use crate::auth::{BoxError, FindUser};
use crate::models::DemoUser;

/// Failure to register a user.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to generate salt: {0}")]
    Salt(String),
    #[error("failed to hash password: {0}")]
    Hash(String),
}

struct Entry {
    user: DemoUser,
    password_hash: String,
}

#[derive(Default)]
pub struct UserDirectory {
    users: RwLock<HashMap<String, Entry>>,
}

fn hash_password(password: &str) -> Result<String, StoreError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| StoreError::Salt(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| StoreError::Salt(e.to_string()))?;
    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| StoreError::Hash(e.to_string()))?;
    Ok(phc.to_string())
}

fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a user.
    ///
    /// # Errors
    ///
    /// [`StoreError`] when the password cannot be hashed.
    pub async fn insert(
        &self,
        username: &str,
        display_name: &str,
        password: &str,
    ) -> Result<(), StoreError> {
        let entry = Entry {
            user: DemoUser {
                username: username.to_string(),
                display_name: display_name.to_string(),
            },
            password_hash: hash_password(password)?,
        };
        self.users.write().await.insert(username.to_string(), entry);
        Ok(())
    }

    /// Return the user if `password` matches.
    pub async fn verify(&self, username: &str, password: &str) -> Option<DemoUser> {
        let users = self.users.read().await;
        let entry = users.get(username)?;
        verify_password(&entry.password_hash, password).then(|| entry.user.clone())
    }
}

impl FindUser for UserDirectory {
    type User = DemoUser;

    async fn find_user(&self, id: &str) -> Result<DemoUser, BoxError> {
        self.users
            .read()
            .await
            .get(id)
            .map(|entry| entry.user.clone())
            .ok_or_else(|| format!("user '{id}' not found").into())
    }
}
