// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token payload.

use serde::{Deserialize, Serialize};

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Claims carried by a session token.
///
/// Timestamps are whole epoch seconds; `0` means "unset" and is omitted on
/// the wire, as are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSet {
    /// Issuer (`iss`)
    #[serde(rename = "iss", default, skip_serializing_if = "String::is_empty")]
    pub issuer: String,

    /// Subject (`sub`)
    #[serde(rename = "sub", default, skip_serializing_if = "String::is_empty")]
    pub subject: String,

    /// Audience (`aud`)
    #[serde(rename = "aud", default, skip_serializing_if = "String::is_empty")]
    pub audience: String,

    /// Expiration (`exp`)
    #[serde(rename = "exp", default, skip_serializing_if = "is_zero")]
    pub expires_at: i64,

    /// Not before (`nbf`)
    #[serde(rename = "nbf", default, skip_serializing_if = "is_zero")]
    pub not_before: i64,

    /// Issued at (`iat`)
    #[serde(rename = "iat", default, skip_serializing_if = "is_zero")]
    pub issued_at: i64,

    /// Principal identifier chosen by the application (`jti`).
    ///
    /// The codec never compares this against anything.
    #[serde(rename = "jti", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
}

/// Token header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TokenHeader {
    pub alg: String,
    #[serde(default)]
    pub typ: String,
}

impl TokenHeader {
    pub(crate) fn new(alg: &str) -> Self {
        Self {
            alg: alg.to_string(),
            typ: "JWT".to_string(),
        }
    }
}
