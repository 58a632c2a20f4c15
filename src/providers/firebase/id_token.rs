// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Firebase ID token verification.
//!
//! A valid token is an RS256 JWT whose `kid` names a key in Google's
//! securetoken JWKS, with issuer `https://securetoken.google.com/<project>`,
//! audience `<project>`, a non-empty `sub` (the Firebase uid), and `iat` and
//! `auth_time` not in the future.

use chrono::Utc;
use jsonwebtoken::{decode, decode_header, errors::ErrorKind, Validation};
use serde::Deserialize;

use super::jwks::JwksManager;
use crate::providers::{IdentityClaims, ProviderError};

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

const ISSUER_PREFIX: &str = "https://securetoken.google.com/";

/// Claims carried by a Firebase ID token.
#[derive(Debug, Deserialize)]
struct FirebaseTokenClaims {
    sub: String,
    iat: i64,
    exp: i64,
    #[serde(default)]
    auth_time: Option<i64>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    firebase: Option<FirebaseSection>,
}

#[derive(Debug, Deserialize, Default)]
struct FirebaseSection {
    #[serde(default)]
    sign_in_provider: Option<String>,
}

impl From<FirebaseTokenClaims> for IdentityClaims {
    fn from(claims: FirebaseTokenClaims) -> Self {
        Self {
            uid: claims.sub,
            email: claims.email,
            email_verified: claims.email_verified,
            sign_in_provider: claims.firebase.and_then(|f| f.sign_in_provider),
            issued_at: claims.iat,
            expires_at: claims.exp,
        }
    }
}

/// Verifies Firebase ID tokens for one project.
#[derive(Clone)]
pub struct IdTokenVerifier {
    jwks: JwksManager,
    project_id: String,
}

impl IdTokenVerifier {
    pub fn new(jwks: JwksManager, project_id: impl Into<String>) -> Self {
        Self {
            jwks,
            project_id: project_id.into(),
        }
    }

    pub fn jwks(&self) -> &JwksManager {
        &self.jwks
    }

    pub fn issuer(&self) -> String {
        format!("{ISSUER_PREFIX}{}", self.project_id)
    }

    /// Verify `token` and decode its claims.
    pub async fn verify(&self, token: &str) -> Result<IdentityClaims, ProviderError> {
        let header = decode_header(token)
            .map_err(|_| ProviderError::InvalidToken("malformed token".to_string()))?;

        let kid = header
            .kid
            .ok_or_else(|| ProviderError::InvalidToken("token has no key id".to_string()))?;

        let (decoding_key, algorithm) = self.jwks.get_decoding_key(&kid).await?;
        if header.alg != algorithm {
            return Err(ProviderError::InvalidToken(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }

        let mut validation = Validation::new(algorithm);
        validation.leeway = CLOCK_SKEW_LEEWAY;
        validation.set_issuer(&[self.issuer()]);
        validation.set_audience(&[&self.project_id]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        let token_data = decode::<FirebaseTokenClaims>(token, &decoding_key, &validation)
            .map_err(|e| {
                let reason = match e.kind() {
                    ErrorKind::ExpiredSignature => "token expired",
                    ErrorKind::InvalidSignature => "invalid signature",
                    ErrorKind::InvalidIssuer => "invalid issuer",
                    ErrorKind::InvalidAudience => "invalid audience",
                    ErrorKind::ImmatureSignature => "token not yet valid",
                    ErrorKind::MissingRequiredClaim(_) => "missing required claim",
                    _ => "malformed token",
                };
                ProviderError::InvalidToken(reason.to_string())
            })?;

        let claims = token_data.claims;
        if claims.sub.trim().is_empty() {
            return Err(ProviderError::InvalidToken("empty subject".to_string()));
        }
        check_times(&claims, Utc::now().timestamp())?;

        Ok(claims.into())
    }
}

fn check_times(claims: &FirebaseTokenClaims, now: i64) -> Result<(), ProviderError> {
    let latest = now + CLOCK_SKEW_LEEWAY as i64;
    if claims.iat > latest {
        return Err(ProviderError::InvalidToken(
            "token issued in the future".to_string(),
        ));
    }
    match claims.auth_time {
        Some(auth_time) if auth_time <= latest => Ok(()),
        Some(_) => Err(ProviderError::InvalidToken(
            "authentication time in the future".to_string(),
        )),
        None => Err(ProviderError::InvalidToken(
            "missing required claim".to_string(),
        )),
    }
}
