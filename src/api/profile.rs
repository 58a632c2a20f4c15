// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Profile endpoint.

use axum::{extract::State, Json};
use tracing::info;

use super::log_provider_failure;
use crate::{
    auth::Auth,
    error::{ApiError, ErrorBody},
    providers::UserRecord,
    state::AppState,
};

/// Get the authenticated user's full record from the identity provider.
///
/// Any lookup failure, including a user that no longer exists, is a 500.
#[utoipa::path(
    get,
    path = "/profile",
    tag = "Accounts",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "User record", body = UserRecord),
        (status = 403, description = "Missing or invalid bearer token", body = String),
        (status = 500, description = "User lookup failed", body = ErrorBody)
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    Auth(user): Auth,
) -> Result<Json<UserRecord>, ApiError> {
    let record = state
        .bounded(state.provider.get_user(user.uid(), &user.token))
        .await
        .map_err(|e| {
            log_provider_failure("get_user", &e);
            ApiError::internal(format!("Error fetching user data: {e}"))
        })?;

    info!(uid = %record.uid, "Profile fetched");
    Ok(Json(record))
}
