// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Tokens
//!
//! Signed, self-contained session tokens. Nothing is stored server-side:
//! a token carries its own claims and expiry, and a refresh produces a new
//! token rather than mutating the old one.

pub mod claims;
pub mod codec;
pub mod error;
pub mod signer;

pub use claims::ClaimSet;
pub use codec::{compose, compose_for_id, extract};
pub use error::{ClaimCheck, TokenError};
pub use signer::{Hs256Signer, Signer, SignerError};
