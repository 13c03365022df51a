// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token errors.

use super::signer::SignerError;

/// The claim check that rejected a token.
///
/// Checks run in declaration order; the first failure wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimCheck {
    /// `iat` is later than the current time
    IssuedInFuture,
    /// `exp` is earlier than the current time
    Expired,
    /// `aud` differs from the configured audience
    AudienceMismatch,
    /// `iss` differs from the configured issuer
    IssuerMismatch,
    /// `sub` differs from the configured subject
    SubjectMismatch,
}

impl ClaimCheck {
    /// Short machine-readable name, used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            ClaimCheck::IssuedInFuture => "iat_in_future",
            ClaimCheck::Expired => "expired",
            ClaimCheck::AudienceMismatch => "aud_mismatch",
            ClaimCheck::IssuerMismatch => "iss_mismatch",
            ClaimCheck::SubjectMismatch => "sub_mismatch",
        }
    }
}

impl std::fmt::Display for ClaimCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClaimCheck::IssuedInFuture => write!(f, "token was issued in the future"),
            ClaimCheck::Expired => write!(f, "token has expired"),
            ClaimCheck::AudienceMismatch => write!(f, "token audience is invalid"),
            ClaimCheck::IssuerMismatch => write!(f, "token issuer is invalid"),
            ClaimCheck::SubjectMismatch => write!(f, "token subject is invalid"),
        }
    }
}

/// Errors from composing or extracting a token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The token is not three well-formed segments, or a segment does not
    /// decode into the expected structure.
    #[error("token is malformed: {0}")]
    Malformed(String),
    /// The signature does not match the header and payload.
    #[error("token signature is invalid")]
    SignatureInvalid,
    /// Signature is fine but a claim check failed.
    #[error("claim validation failed: {0}")]
    ClaimValidation(ClaimCheck),
    /// The signing capability could not produce a signature.
    #[error("failed to sign token: {0}")]
    SigningFailed(#[source] SignerError),
    /// The header or claims could not be serialized while composing.
    #[error("failed to encode token: {0}")]
    Encoding(String),
}

impl TokenError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        TokenError::Malformed(reason.into())
    }

    /// Short machine-readable name, used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::Malformed(_) => "malformed_token",
            TokenError::SignatureInvalid => "signature_invalid",
            TokenError::ClaimValidation(_) => "claim_validation_failed",
            TokenError::SigningFailed(_) => "signing_failed",
            TokenError::Encoding(_) => "encoding_failed",
        }
    }
}
