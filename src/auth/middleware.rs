// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Applied to a router subtree with
//! `axum::middleware::from_fn_with_state(state, require_auth)`.
//!
//! 1. Take the token after the literal `Bearer ` prefix of `Authorization`
//! 2. Ask the identity provider to verify it (bounded by the provider timeout)
//! 3. On success insert [`AuthenticatedUser`] into the request extensions and
//!    continue; otherwise answer `403 Unauthorized`

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};

use super::{AuthError, AuthenticatedUser};
use crate::state::AppState;

/// Extract the bearer token from request headers.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_str = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AuthError::InvalidAuthHeader)?;

    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }

    Ok(token)
}

/// Verify the request's bearer token with the identity provider.
pub async fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<AuthenticatedUser, AuthError> {
    let token = bearer_token(headers)?;
    let claims = state.bounded(state.provider.verify_token(token)).await?;
    Ok(AuthenticatedUser::new(claims, token))
}

/// Authentication middleware function.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let result = authenticate(&state, request.headers()).await;
    match result {
        Ok(user) => {
            debug!(uid = %user.uid(), "Request authenticated");
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            log_rejection(&e, request.uri().path());
            e.into_response()
        }
    }
}

pub(crate) fn log_rejection(err: &AuthError, path: &str) {
    match err {
        AuthError::ProviderUnavailable(_) => error!(
            path = %path,
            error_code = err.error_code(),
            error = %err,
            "Token verification unavailable"
        ),
        _ => warn!(
            path = %path,
            error_code = err.error_code(),
            error = %err,
            "Request rejected by authentication"
        ),
    }
}
