// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Response bodies of the account endpoints. The request body of `/signup`
//! and `/login` is [`Credentials`](crate::providers::Credentials); `/profile`
//! returns the provider's [`UserRecord`](crate::providers::UserRecord)
//! as-is.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::providers::{CreatedIdentity, SessionToken};

/// Response for `POST /signup`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct SignupResponse {
    /// Unique id of the new user.
    pub uid: String,
    /// Email the user registered with.
    pub email: String,
}

impl From<CreatedIdentity> for SignupResponse {
    fn from(identity: CreatedIdentity) -> Self {
        Self {
            uid: identity.uid,
            email: identity.email,
        }
    }
}

/// Response for `POST /login`.
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Session token to send as `Authorization: Bearer <token>`.
    pub token: String,
}

impl From<SessionToken> for LoginResponse {
    fn from(session: SessionToken) -> Self {
        Self {
            token: session.token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signup_response_serializes_uid_and_email_only() {
        let response = SignupResponse::from(CreatedIdentity {
            uid: "uid_1".to_string(),
            email: "a@x.com".to_string(),
        });
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"uid":"uid_1","email":"a@x.com"}"#
        );
    }

    #[test]
    fn login_response_drops_token_lifetime() {
        let response = LoginResponse::from(SessionToken {
            token: "tok".to_string(),
            expires_in: Some(3600),
        });
        assert_eq!(serde_json::to_string(&response).unwrap(), r#"{"token":"tok"}"#);
    }
}
