// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated users.
//!
//! ```rust,ignore
//! async fn my_handler(Auth(user): Auth) -> impl IntoResponse {
//!     // user is AuthenticatedUser
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};

use super::middleware::{authenticate, log_rejection};
use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Extractor for authenticated users.
///
/// Uses the identity that [`require_auth`](super::middleware::require_auth)
/// attached to the request. Outside that middleware it verifies the bearer
/// token itself, with the same `403 Unauthorized` rejection.
pub struct Auth(pub AuthenticatedUser);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // First check if middleware already set the user
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>().cloned() {
            return Ok(Auth(user));
        }

        match authenticate(state, &parts.headers).await {
            Ok(user) => {
                parts.extensions.insert(user.clone());
                Ok(Auth(user))
            }
            Err(e) => {
                log_rejection(&e, parts.uri.path());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{Credentials, IdentityClaims, IdentityProvider};
    use axum::http::Request;

    fn parts_with(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/profile");
        if let Some(value) = auth {
            builder = builder.header("Authorization", value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn auth_extractor_requires_auth_header() {
        let state = AppState::default();
        let mut parts = parts_with(None);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingAuthHeader)));
    }

    #[tokio::test]
    async fn auth_extractor_prefers_extensions() {
        let state = AppState::default();
        let mut parts = parts_with(None);

        let user = AuthenticatedUser::new(
            IdentityClaims {
                uid: "user_from_middleware".to_string(),
                email: None,
                email_verified: false,
                sign_in_provider: None,
                issued_at: 0,
                expires_at: 0,
            },
            "tok",
        );
        parts.extensions.insert(user);

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.unwrap().0.uid(), "user_from_middleware");
    }

    #[tokio::test]
    async fn auth_extractor_verifies_token_without_middleware() {
        let provider = crate::providers::memory::InMemoryProvider::new();
        let creds = Credentials::new("a@x.com", "secret123");
        let created = provider.create_identity(&creds).await.unwrap();
        let signed_in = provider.verify_credential(&creds).await.unwrap();
        let state = AppState::new(std::sync::Arc::new(provider));

        let header = format!("Bearer {}", signed_in.id_token);
        let mut parts = parts_with(Some(&header));

        let Auth(user) = Auth::from_request_parts(&mut parts, &state)
            .await
            .expect("token verifies");
        assert_eq!(user.uid(), created.uid);
        assert!(parts.extensions.get::<AuthenticatedUser>().is_some());
    }
}
