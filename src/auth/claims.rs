// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authenticated user representation.

use crate::providers::IdentityClaims;

/// Identity attached to a request once its bearer token has been verified.
///
/// Lives in the request extensions for the duration of one request.
#[derive(Clone)]
pub struct AuthenticatedUser {
    /// Verified claims decoded by the identity provider
    pub claims: IdentityClaims,
    /// The bearer token the claims were decoded from
    pub token: String,
}

impl AuthenticatedUser {
    pub fn new(claims: IdentityClaims, token: impl Into<String>) -> Self {
        Self {
            claims,
            token: token.into(),
        }
    }

    /// Canonical user id.
    pub fn uid(&self) -> &str {
        &self.claims.uid
    }
}

impl std::fmt::Debug for AuthenticatedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthenticatedUser")
            .field("claims", &self.claims)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claims() -> IdentityClaims {
        IdentityClaims {
            uid: "uid_123".to_string(),
            email: Some("a@x.com".to_string()),
            email_verified: true,
            sign_in_provider: Some("password".to_string()),
            issued_at: 1700000000,
            expires_at: 1700003600,
        }
    }

    #[test]
    fn uid_comes_from_claims() {
        let user = AuthenticatedUser::new(sample_claims(), "tok");
        assert_eq!(user.uid(), "uid_123");
    }

    #[test]
    fn debug_omits_token() {
        let user = AuthenticatedUser::new(sample_claims(), "very-secret-token");
        let debug = format!("{user:?}");
        assert!(debug.contains("uid_123"));
        assert!(!debug.contains("very-secret-token"));
    }
}
