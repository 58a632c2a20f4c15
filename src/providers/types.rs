// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Values exchanged with an identity provider.
//!
//! All of these are request-scoped pass-through values. Nothing here is
//! persisted by the gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Email/password pair submitted to `/signup` and `/login`.
#[derive(Clone, Deserialize, ToSchema)]
pub struct Credentials {
    /// Account email address.
    pub email: String,
    /// Account password. Validated by the identity provider.
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Identity returned by a successful sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIdentity {
    pub uid: String,
    pub email: String,
}

/// Identity returned by a successful credential check.
///
/// Carries the provider handles needed to request a fresh session token.
#[derive(Clone)]
pub struct SignedInIdentity {
    pub uid: String,
    pub email: String,
    /// Token issued alongside the sign-in.
    pub id_token: String,
    /// Long-lived handle used to mint fresh session tokens.
    pub refresh_token: String,
}

impl std::fmt::Debug for SignedInIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedInIdentity")
            .field("uid", &self.uid)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Opaque session token issued by the provider.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub token: String,
    /// Lifetime in seconds, when the provider reports one.
    pub expires_in: Option<u64>,
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionToken")
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

/// Verified claims decoded from a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct IdentityClaims {
    /// Unique user identifier.
    pub uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    /// How the user signed in (e.g. `password`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sign_in_provider: Option<String>,
    /// Issued at (unix seconds).
    pub issued_at: i64,
    /// Expiration (unix seconds).
    pub expires_at: i64,
}

/// Provider-held user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserRecord {
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub phone_number: Option<String>,
    pub disabled: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    /// Linked sign-in methods.
    pub provider_data: Vec<ProviderInfo>,
}

/// One sign-in method linked to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProviderInfo {
    pub provider_id: String,
    pub uid: Option<String>,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = Credentials::new("a@x.com", "secret123");
        let debug = format!("{creds:?}");
        assert!(debug.contains("a@x.com"));
        assert!(!debug.contains("secret123"));
    }

    #[test]
    fn credentials_require_both_fields() {
        let ok: Result<Credentials, _> =
            serde_json::from_str(r#"{"email":"a@x.com","password":"pw"}"#);
        assert!(ok.is_ok());

        let missing: Result<Credentials, _> = serde_json::from_str(r#"{"email":"a@x.com"}"#);
        assert!(missing.is_err());

        let wrong_type: Result<Credentials, _> =
            serde_json::from_str(r#"{"email":"a@x.com","password":123}"#);
        assert!(wrong_type.is_err());
    }

    #[test]
    fn session_token_debug_hides_token() {
        let token = SessionToken {
            token: "eyJhbGciOi.secret".to_string(),
            expires_in: Some(3600),
        };
        assert!(!format!("{token:?}").contains("eyJhbGciOi"));
    }

    #[test]
    fn identity_claims_skip_absent_email() {
        let claims = IdentityClaims {
            uid: "u1".to_string(),
            email: None,
            email_verified: false,
            sign_in_provider: None,
            issued_at: 1,
            expires_at: 2,
        };
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["uid"], "u1");
        assert!(value.get("email").is_none());
    }
}
