// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.
//!
//! Every variant produces the same response: `403` with the plain-text body
//! `Unauthorized`. Callers never learn why a token was refused; the variant
//! only feeds the logs.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::providers::ProviderError;

/// Fixed body of every authentication failure.
pub const UNAUTHORIZED_BODY: &str = "Unauthorized";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Header present but not `Bearer <token>`
    InvalidAuthHeader,
    /// The identity provider refused the token
    TokenRejected(String),
    /// The identity provider could not be asked
    ProviderUnavailable(String),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::TokenRejected(_) => "token_rejected",
            AuthError::ProviderUnavailable(_) => "provider_unavailable",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::FORBIDDEN
    }
}

impl From<ProviderError> for AuthError {
    fn from(err: ProviderError) -> Self {
        if err.is_outage() {
            AuthError::ProviderUnavailable(err.to_string())
        } else {
            AuthError::TokenRejected(err.to_string())
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "Authorization header is required"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::TokenRejected(reason) => write!(f, "Token rejected: {reason}"),
            AuthError::ProviderUnavailable(reason) => {
                write!(f, "Token could not be verified: {reason}")
            }
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status_code(), UNAUTHORIZED_BODY).into_response()
    }
}
