// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign-up and login endpoints.

use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

use super::{log_provider_failure, ApiJson};
use crate::{
    error::{ApiError, ErrorBody},
    models::{LoginResponse, SignupResponse},
    providers::Credentials,
    state::AppState,
};

/// Create a new email/password account.
///
/// Validation (email format, password strength, duplicates) is done by the
/// identity provider; its message is returned on failure.
#[utoipa::path(
    post,
    path = "/signup",
    request_body = Credentials,
    tag = "Accounts",
    responses(
        (status = 201, description = "User created", body = SignupResponse),
        (status = 400, description = "Rejected by the identity provider", body = ErrorBody)
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let identity = state
        .bounded(state.provider.create_identity(&credentials))
        .await
        .map_err(|e| {
            log_provider_failure("create_identity", &e);
            ApiError::bad_request(format!("Error creating user: {e}"))
        })?;

    info!(uid = %identity.uid, provider = state.provider.name(), "User created");
    Ok((StatusCode::CREATED, Json(identity.into())))
}

/// Exchange email/password for a fresh session token.
#[utoipa::path(
    post,
    path = "/login",
    request_body = Credentials,
    tag = "Accounts",
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Rejected by the identity provider", body = ErrorBody)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<Json<LoginResponse>, ApiError> {
    let login_failed = |operation: &str, e: crate::providers::ProviderError| {
        log_provider_failure(operation, &e);
        ApiError::bad_request(format!("Error logging in: {e}"))
    };

    let identity = state
        .bounded(state.provider.verify_credential(&credentials))
        .await
        .map_err(|e| login_failed("verify_credential", e))?;

    let session = state
        .bounded(state.provider.issue_token(&identity))
        .await
        .map_err(|e| login_failed("issue_token", e))?;

    info!(uid = %identity.uid, provider = state.provider.name(), "User logged in");
    Ok(Json(session.into()))
}
