// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Firebase Authentication integration.
//!
//! Talks to the Identity Toolkit REST API (`accounts:signUp`,
//! `accounts:signInWithPassword`, `accounts:lookup`) and the Secure Token API
//! (refresh-token exchange), authenticated with the project's web API key.
//! ID tokens are verified locally against Google's published signing keys.
//!
//! Provider errors arrive as `{"error": {"code": 400, "message": "EMAIL_EXISTS"}}`;
//! the leading word of `message` becomes the [`ProviderError::Rejected`] code.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::config::FirebaseConfig;
use crate::providers::{
    CreatedIdentity, Credentials, IdentityClaims, IdentityProvider, ProviderError, ProviderInfo,
    SessionToken, SignedInIdentity, UserRecord,
};

pub mod id_token;
pub mod jwks;

pub use id_token::IdTokenVerifier;
pub use jwks::JwksManager;

/// Header carrying the Firebase app id on REST calls.
const APP_ID_HEADER: &str = "X-Firebase-gmpid";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    id_token: String,
    refresh_token: String,
}

/// Secure Token API answers in snake_case.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    disabled: bool,
    /// Milliseconds since epoch, as a string.
    #[serde(default)]
    created_at: Option<String>,
    #[serde(default)]
    last_login_at: Option<String>,
    #[serde(default)]
    provider_user_info: Vec<LookupProviderInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupProviderInfo {
    provider_id: String,
    #[serde(default)]
    raw_id: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Firebase Authentication REST client.
#[derive(Clone)]
pub struct FirebaseClient {
    config: FirebaseConfig,
    http: Client,
    verifier: IdTokenVerifier,
}

impl FirebaseClient {
    /// Build a client whose HTTP calls are bounded by `timeout`.
    pub fn new(config: FirebaseConfig, timeout: Duration) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Unavailable(format!("failed to build HTTP client: {e}")))?;

        let jwks = JwksManager::new(config.jwks_url.clone(), http.clone());
        let verifier = IdTokenVerifier::new(jwks, config.project_id.clone());

        Ok(Self {
            config,
            http,
            verifier,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.config.project_id
    }

    fn endpoint(&self, base: &str, path: &str) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&format!("{}/{}", base.trim_end_matches('/'), path))
            .map_err(|e| ProviderError::Unavailable(format!("invalid endpoint {base}: {e}")))?;
        url.query_pairs_mut()
            .append_pair("key", &self.config.api_key);
        Ok(url)
    }

    fn identity_toolkit(&self, method: &str) -> Result<Url, ProviderError> {
        self.endpoint(&self.config.identity_toolkit_url, &format!("accounts:{method}"))
    }

    fn with_app_id(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.app_id {
            Some(app_id) => request.header(APP_ID_HEADER, app_id),
            None => request,
        }
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: serde_json::Value,
    ) -> Result<T, ProviderError> {
        let url = self.identity_toolkit(method)?;
        let request = self.with_app_id(self.http.post(url).json(&payload));
        send(request, method).await
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder, what: &str) -> Result<T, ProviderError> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            ProviderError::Unavailable(format!("{what} timed out"))
        } else {
            ProviderError::Unavailable(format!("{what} failed: {}", e.without_url()))
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!(%status, call = %what, "Firebase returned an error response");
        return Err(map_error_response(status, &body));
    }

    response
        .json()
        .await
        .map_err(|e| ProviderError::InvalidResponse(format!("{what}: {e}")))
}

/// Map a non-success Firebase response to a [`ProviderError`].
fn map_error_response(status: StatusCode, body: &str) -> ProviderError {
    if status.is_server_error() {
        return ProviderError::Unavailable(format!("HTTP {status}"));
    }

    let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
        return ProviderError::InvalidResponse(format!("HTTP {status} without error body"));
    };

    let message = envelope.error.message;
    let code = message
        .split([' ', ':'])
        .next()
        .unwrap_or_default()
        .to_string();

    match code.as_str() {
        "USER_NOT_FOUND" => ProviderError::UserNotFound,
        "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => {
            ProviderError::InvalidToken(message)
        }
        _ => ProviderError::Rejected { code, message },
    }
}

fn millis_to_datetime(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| v.parse::<i64>().ok())
        .and_then(DateTime::from_timestamp_millis)
}

impl From<LookupUser> for UserRecord {
    fn from(user: LookupUser) -> Self {
        Self {
            created_at: millis_to_datetime(user.created_at.as_deref()),
            last_login_at: millis_to_datetime(user.last_login_at.as_deref()),
            uid: user.local_id,
            email: user.email,
            email_verified: user.email_verified,
            display_name: user.display_name,
            photo_url: user.photo_url,
            phone_number: user.phone_number,
            disabled: user.disabled,
            provider_data: user
                .provider_user_info
                .into_iter()
                .map(|info| ProviderInfo {
                    provider_id: info.provider_id,
                    uid: info.raw_id,
                    email: info.email,
                    display_name: info.display_name,
                })
                .collect(),
        }
    }
}

#[async_trait]
impl IdentityProvider for FirebaseClient {
    fn name(&self) -> &'static str {
        "firebase"
    }

    async fn create_identity(
        &self,
        credentials: &Credentials,
    ) -> Result<CreatedIdentity, ProviderError> {
        let response: SignUpResponse = self
            .post_json(
                "signUp",
                json!({
                    "email": credentials.email,
                    "password": credentials.password,
                    "returnSecureToken": true
                }),
            )
            .await?;

        Ok(CreatedIdentity {
            uid: response.local_id,
            email: response.email.unwrap_or_else(|| credentials.email.clone()),
        })
    }

    async fn verify_credential(
        &self,
        credentials: &Credentials,
    ) -> Result<SignedInIdentity, ProviderError> {
        let response: SignInResponse = self
            .post_json(
                "signInWithPassword",
                json!({
                    "email": credentials.email,
                    "password": credentials.password,
                    "returnSecureToken": true
                }),
            )
            .await?;

        Ok(SignedInIdentity {
            uid: response.local_id,
            email: response.email.unwrap_or_else(|| credentials.email.clone()),
            id_token: response.id_token,
            refresh_token: response.refresh_token,
        })
    }

    async fn issue_token(
        &self,
        identity: &SignedInIdentity,
    ) -> Result<SessionToken, ProviderError> {
        let url = self.endpoint(&self.config.secure_token_url, "token")?;
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", identity.refresh_token.as_str()),
        ];
        let request = self.with_app_id(self.http.post(url).form(&form));
        let response: RefreshResponse = send(request, "token").await?;

        if response.id_token.trim().is_empty() {
            return Err(ProviderError::InvalidResponse(
                "token response did not include id_token".to_string(),
            ));
        }

        Ok(SessionToken {
            token: response.id_token,
            expires_in: response.expires_in.and_then(|v| v.parse().ok()),
        })
    }

    async fn verify_token(&self, token: &str) -> Result<IdentityClaims, ProviderError> {
        self.verifier.verify(token).await
    }

    async fn get_user(&self, uid: &str, token: &str) -> Result<UserRecord, ProviderError> {
        let response: LookupResponse = self.post_json("lookup", json!({ "idToken": token })).await?;

        // A lookup by ID token returns the token owner; anything else means
        // the uid no longer resolves.
        response
            .users
            .into_iter()
            .find(|user| user.local_id == uid)
            .map(UserRecord::from)
            .ok_or(ProviderError::UserNotFound)
    }

    async fn check_ready(&self) -> Result<(), ProviderError> {
        if self.verifier.jwks().is_cached().await {
            return Ok(());
        }
        self.verifier.jwks().refresh().await.map(|_| ())
    }
}
