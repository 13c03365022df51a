// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Compose and verify signed tokens.
//!
//! A token is `base64url(header).base64url(claims).base64url(signature)`,
//! unpadded. The signature covers the first two segments joined by `.`.

use base64ct::{Base64UrlUnpadded, Encoding};

use super::claims::{ClaimSet, TokenHeader};
use super::error::{ClaimCheck, TokenError};
use super::signer::Signer;
use crate::clock::Clock;
use crate::config::{default_lifetime, Config};

/// Sign `claims`.
///
/// Unset `iat` and `nbf` are filled with the current time, an unset `exp`
/// with the current time plus the default lifetime.
///
/// # Errors
///
/// [`TokenError::SigningFailed`] when the signer refuses,
/// [`TokenError::Encoding`] when the header or claims fail to serialize.
pub fn compose(
    claims: &ClaimSet,
    signer: &dyn Signer,
    clock: &dyn Clock,
) -> Result<String, TokenError> {
    let now = clock.now_secs();
    let mut claims = claims.clone();
    if claims.issued_at == 0 {
        claims.issued_at = now;
    }
    if claims.not_before == 0 {
        claims.not_before = now;
    }
    if claims.expires_at == 0 {
        claims.expires_at = now + default_lifetime().num_seconds();
    }

    let header = serde_json::to_vec(&TokenHeader::new(signer.algorithm()))
        .map_err(|e| TokenError::Encoding(e.to_string()))?;
    let payload =
        serde_json::to_vec(&claims).map_err(|e| TokenError::Encoding(e.to_string()))?;

    let signing_input = format!(
        "{}.{}",
        Base64UrlUnpadded::encode_string(&header),
        Base64UrlUnpadded::encode_string(&payload)
    );
    let signature = signer
        .sign(signing_input.as_bytes())
        .map_err(TokenError::SigningFailed)?;

    Ok(format!(
        "{signing_input}.{}",
        Base64UrlUnpadded::encode_string(&signature)
    ))
}

/// Issue a token for principal `id` using the claims from `config`.
///
/// `iat` and `nbf` are set to now, `exp` to now plus the configured lifetime.
///
/// # Errors
///
/// [`TokenError::SigningFailed`] when the configured signer refuses.
pub fn compose_for_id(id: &str, config: &Config, clock: &dyn Clock) -> Result<String, TokenError> {
    let now = clock.now_secs();
    let claims = ClaimSet {
        issuer: config.issuer().to_string(),
        subject: config.subject().to_string(),
        audience: config.audience().to_string(),
        expires_at: now + config.lifetime().num_seconds(),
        not_before: now,
        issued_at: now,
        id: id.to_string(),
    };
    compose(&claims, config.signer(), clock)
}

/// Verify `token` and return its claims.
///
/// The signature is checked before the payload is deserialized. Claims are
/// then checked in this order: `iat` not in the future, not expired,
/// audience, issuer, subject. The identifier is returned unchecked.
///
/// # Errors
///
/// - [`TokenError::Malformed`] for structural or schema problems
/// - [`TokenError::SignatureInvalid`] when the signature does not verify
/// - [`TokenError::ClaimValidation`] naming the first failing check
pub fn extract(token: &str, config: &Config, clock: &dyn Clock) -> Result<ClaimSet, TokenError> {
    let mut segments = token.split('.');
    let (header_b64, payload_b64, signature_b64) =
        match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(h), Some(p), Some(s), None) => (h, p, s),
            _ => return Err(TokenError::malformed("expected three segments")),
        };

    let signature = decode_segment(signature_b64, "signature")?;
    let signing_input_len = header_b64.len() + 1 + payload_b64.len();
    let signing_input = &token.as_bytes()[..signing_input_len];

    config
        .signer()
        .verify(signing_input, &signature)
        .map_err(|_| TokenError::SignatureInvalid)?;

    let header: TokenHeader = serde_json::from_slice(&decode_segment(header_b64, "header")?)
        .map_err(|e| TokenError::malformed(format!("header: {e}")))?;
    if header.alg != config.signer().algorithm() {
        return Err(TokenError::malformed(format!(
            "unexpected algorithm '{}'",
            header.alg
        )));
    }

    let claims: ClaimSet = serde_json::from_slice(&decode_segment(payload_b64, "payload")?)
        .map_err(|e| TokenError::malformed(format!("payload: {e}")))?;

    validate(&claims, config, clock.now_secs())?;
    Ok(claims)
}

fn decode_segment(segment: &str, what: &str) -> Result<Vec<u8>, TokenError> {
    Base64UrlUnpadded::decode_vec(segment)
        .map_err(|e| TokenError::malformed(format!("{what}: {e}")))
}

fn validate(claims: &ClaimSet, config: &Config, now: i64) -> Result<(), TokenError> {
    let checks = [
        (claims.issued_at <= now, ClaimCheck::IssuedInFuture),
        (now <= claims.expires_at, ClaimCheck::Expired),
        (claims.audience == config.audience(), ClaimCheck::AudienceMismatch),
        (claims.issuer == config.issuer(), ClaimCheck::IssuerMismatch),
        (claims.subject == config.subject(), ClaimCheck::SubjectMismatch),
    ];
    match checks.into_iter().find(|(ok, _)| !ok) {
        Some((_, failed)) => Err(TokenError::ClaimValidation(failed)),
        None => Ok(()),
    }
}
