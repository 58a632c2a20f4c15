// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Identity Providers
//!
//! Every consequential identity operation (credential storage, password
//! checks, token issuance and verification, user lookup) is delegated to an
//! external identity provider. Handlers and the auth middleware only see the
//! [`IdentityProvider`] trait; the concrete client is built once in `main`
//! and shared through `AppState`.
//!
//! ## Implementations
//!
//! - [`firebase::FirebaseClient`] - Firebase Authentication REST API
//! - `memory::InMemoryProvider` - in-process double (tests and `dev` feature)
//!
//! ## Timeouts
//!
//! Calls are never retried. [`with_deadline`] bounds each call so that a
//! stalled provider terminates the request instead of hanging it.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

pub mod firebase;
#[cfg(any(test, feature = "dev"))]
pub mod memory;
pub mod types;

pub use types::{
    CreatedIdentity, Credentials, IdentityClaims, ProviderInfo, SessionToken, SignedInIdentity,
    UserRecord,
};

/// Failure reported by (or while talking to) the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The provider refused the request (duplicate email, weak password,
    /// wrong password, disabled account, ...).
    #[error("{message}")]
    Rejected { code: String, message: String },

    #[error("USER_NOT_FOUND")]
    UserNotFound,

    /// The presented token failed verification.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// The provider could not be reached or answered with a server error.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),

    #[error("identity provider response was invalid: {0}")]
    InvalidResponse(String),

    #[error("identity provider did not respond within {}s", .0.as_secs())]
    Timeout(Duration),
}

impl ProviderError {
    /// Stable short code for logs.
    pub fn code(&self) -> &str {
        match self {
            ProviderError::Rejected { code, .. } => code,
            ProviderError::UserNotFound => "user_not_found",
            ProviderError::InvalidToken(_) => "invalid_token",
            ProviderError::Unavailable(_) => "provider_unavailable",
            ProviderError::InvalidResponse(_) => "invalid_provider_response",
            ProviderError::Timeout(_) => "provider_timeout",
        }
    }

    /// Whether the failure says nothing about the caller's input.
    pub fn is_outage(&self) -> bool {
        matches!(
            self,
            ProviderError::Unavailable(_)
                | ProviderError::InvalidResponse(_)
                | ProviderError::Timeout(_)
        )
    }
}

/// Capability set of an external identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short name used in logs and health output.
    fn name(&self) -> &'static str;

    /// Create a new email/password identity.
    async fn create_identity(
        &self,
        credentials: &Credentials,
    ) -> Result<CreatedIdentity, ProviderError>;

    /// Check an email/password pair.
    async fn verify_credential(
        &self,
        credentials: &Credentials,
    ) -> Result<SignedInIdentity, ProviderError>;

    /// Issue a fresh session token for a signed-in identity.
    async fn issue_token(&self, identity: &SignedInIdentity)
        -> Result<SessionToken, ProviderError>;

    /// Verify a session token and decode its claims.
    async fn verify_token(&self, token: &str) -> Result<IdentityClaims, ProviderError>;

    /// Fetch the full user record for `uid`.
    ///
    /// `token` is the caller's already-verified session token; providers
    /// that scope user reads to the caller use it to authorize the lookup.
    async fn get_user(&self, uid: &str, token: &str) -> Result<UserRecord, ProviderError>;

    /// Readiness probe. Providers with remote dependencies check them here.
    async fn check_ready(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Run a provider call, failing with [`ProviderError::Timeout`] once
/// `deadline` elapses.
pub async fn with_deadline<T, F>(deadline: Duration, call: F) -> Result<T, ProviderError>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(deadline)),
    }
}
