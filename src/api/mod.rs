// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    extract::FromRequest,
    http::Request,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info_span, warn, Span};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::require_auth,
    error::{ApiError, ErrorBody},
    models::{LoginResponse, SignupResponse},
    providers::{Credentials, ProviderError, ProviderInfo, UserRecord},
    state::AppState,
};

pub mod accounts;
pub mod health;
pub mod profile;

/// JSON body extractor whose rejections are `400` [`ApiError`]s.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/profile", get(profile::get_profile))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let routes = Router::new()
        .route("/signup", post(accounts::signup))
        .route("/login", post(accounts::login))
        .merge(protected)
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(CorsLayer::permissive()),
        )
}

// Headers are left out of the span: they carry bearer tokens.
fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");

    info_span!(
        "http-request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id
    )
}

/// Log a failed provider call at a level matching its cause.
pub(crate) fn log_provider_failure(operation: &str, err: &ProviderError) {
    if err.is_outage() {
        error!(
            operation,
            error_code = err.code(),
            error = %err,
            "Identity provider call failed"
        );
    } else {
        warn!(
            operation,
            error_code = err.code(),
            error = %err,
            "Identity provider refused request"
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        accounts::signup,
        accounts::login,
        profile::get_profile,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Credentials,
            SignupResponse,
            LoginResponse,
            UserRecord,
            ProviderInfo,
            ErrorBody,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "Accounts", description = "Sign-up, login and profile"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Bytes},
        http::{header, Method, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::providers::memory::InMemoryProvider;
    use crate::providers::{
        CreatedIdentity, IdentityClaims, IdentityProvider, SessionToken, SignedInIdentity,
    };

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Bytes) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_profile(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(Method::GET).uri("/profile");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn json_body(bytes: &Bytes) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    async fn signup(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
        let (status, body) = send(
            app,
            post_json("/signup", json!({ "email": email, "password": password })),
        )
        .await;
        (status, json_body(&body))
    }

    async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
        let (status, body) = send(
            app,
            post_json("/login", json!({ "email": email, "password": password })),
        )
        .await;
        (status, json_body(&body))
    }

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(AppState::default());
        let _ = app.into_make_service();
    }

    #[tokio::test]
    async fn signup_returns_uid_and_submitted_email() {
        let app = router(AppState::default());
        let (status, body) = signup(&app, "a@x.com", "secret123").await;

        assert_eq!(status, StatusCode::CREATED);
        assert!(!body["uid"].as_str().unwrap().is_empty());
        assert_eq!(body["email"], "a@x.com");
    }

    #[tokio::test]
    async fn repeated_signup_is_bad_request() {
        let app = router(AppState::default());
        let (first, _) = signup(&app, "a@x.com", "secret123").await;
        assert_eq!(first, StatusCode::CREATED);

        let (second, body) = signup(&app, "a@x.com", "secret123").await;
        assert_eq!(second, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Error creating user: EMAIL_EXISTS");
    }

    #[tokio::test]
    async fn login_with_mismatched_password_is_bad_request() {
        let app = router(AppState::default());
        signup(&app, "a@x.com", "secret123").await;

        let (status, body) = login(&app, "a@x.com", "not-the-password").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Error logging in: "));
    }

    #[tokio::test]
    async fn malformed_bodies_are_bad_request() {
        let app = router(AppState::default());

        let (status, body) = send(&app, post_json("/signup", json!({ "email": "a@x.com" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json_body(&body)["error"]
            .as_str()
            .unwrap()
            .starts_with("Invalid request body"));

        let (status, _) = send(
            &app,
            post_json("/login", json!({ "email": "a@x.com", "password": 42 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let not_json = Request::builder()
            .method(Method::POST)
            .uri("/signup")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _) = send(&app, not_json).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn profile_without_authorization_is_exactly_unauthorized() {
        let app = router(AppState::default());
        let (status, body) = send(&app, get_profile(None)).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(&body[..], b"Unauthorized");
    }

    #[tokio::test]
    async fn profile_with_non_bearer_scheme_is_forbidden() {
        let app = router(AppState::default());
        for value in ["Basic YTpi", "Token abc", "bearer abc", "Bearer"] {
            let (status, body) = send(&app, get_profile(Some(value))).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "header {value:?}");
            assert_eq!(&body[..], b"Unauthorized");
        }
    }

    #[tokio::test]
    async fn profile_with_invalid_token_is_forbidden() {
        let app = router(AppState::default());
        let (status, body) = send(&app, get_profile(Some("Bearer eyJhbGciOi.abc.def"))).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(&body[..], b"Unauthorized");
    }

    #[tokio::test]
    async fn profile_with_expired_token_is_forbidden() {
        let provider = InMemoryProvider::new().with_token_ttl(Duration::ZERO);
        let app = router(AppState::new(Arc::new(provider)));
        signup(&app, "a@x.com", "secret123").await;
        let (status, body) = login(&app, "a@x.com", "secret123").await;
        assert_eq!(status, StatusCode::OK);

        let token = body["token"].as_str().unwrap();
        let (status, _) = send(&app, get_profile(Some(&format!("Bearer {token}")))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn signup_login_profile_round_trip() {
        let app = router(AppState::default());

        let (status, created) = signup(&app, "a@x.com", "secret123").await;
        assert_eq!(status, StatusCode::CREATED);
        let uid = created["uid"].as_str().unwrap().to_string();

        let (status, logged_in) = login(&app, "a@x.com", "secret123").await;
        assert_eq!(status, StatusCode::OK);
        let token = logged_in["token"].as_str().unwrap();
        assert!(!token.is_empty());

        let (status, body) = send(&app, get_profile(Some(&format!("Bearer {token}")))).await;
        assert_eq!(status, StatusCode::OK);
        let profile = json_body(&body);
        assert_eq!(profile["uid"], uid.as_str());
        assert_eq!(profile["email"], "a@x.com");
    }

    #[tokio::test]
    async fn different_tokens_resolve_to_different_users() {
        let app = router(AppState::default());
        signup(&app, "a@x.com", "secret123").await;
        signup(&app, "b@x.com", "secret456").await;

        let (_, a) = login(&app, "a@x.com", "secret123").await;
        let (_, b) = login(&app, "b@x.com", "secret456").await;

        let (_, a_profile) = send(
            &app,
            get_profile(Some(&format!("Bearer {}", a["token"].as_str().unwrap()))),
        )
        .await;
        let (_, b_profile) = send(
            &app,
            get_profile(Some(&format!("Bearer {}", b["token"].as_str().unwrap()))),
        )
        .await;

        assert_ne!(json_body(&a_profile)["uid"], json_body(&b_profile)["uid"]);
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let app = router(AppState::default());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/live")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn openapi_document_lists_routes() {
        let app = router(AppState::default());
        let request = Request::builder()
            .uri("/api-doc/openapi.json")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);

        let doc = json_body(&body);
        for path in ["/signup", "/login", "/profile", "/health/live"] {
            assert!(doc["paths"].get(path).is_some(), "missing {path}");
        }
        assert!(doc["components"]["securitySchemes"].get("bearer").is_some());
    }

    /// Verifies tokens normally but never answers sign-ups or lookups.
    struct StalledProvider {
        inner: InMemoryProvider,
    }

    #[async_trait]
    impl IdentityProvider for StalledProvider {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn create_identity(
            &self,
            _credentials: &Credentials,
        ) -> Result<CreatedIdentity, ProviderError> {
            std::future::pending().await
        }

        async fn verify_credential(
            &self,
            credentials: &Credentials,
        ) -> Result<SignedInIdentity, ProviderError> {
            self.inner.verify_credential(credentials).await
        }

        async fn issue_token(
            &self,
            identity: &SignedInIdentity,
        ) -> Result<SessionToken, ProviderError> {
            self.inner.issue_token(identity).await
        }

        async fn verify_token(&self, token: &str) -> Result<IdentityClaims, ProviderError> {
            self.inner.verify_token(token).await
        }

        async fn get_user(&self, _uid: &str, _token: &str) -> Result<UserRecord, ProviderError> {
            std::future::pending().await
        }

        async fn check_ready(&self) -> Result<(), ProviderError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_provider_calls_are_cut_off() {
        let inner = InMemoryProvider::new();
        let creds = Credentials::new("a@x.com", "secret123");
        inner.create_identity(&creds).await.unwrap();
        let token = inner.verify_credential(&creds).await.unwrap().id_token;

        let state = AppState::new(Arc::new(StalledProvider { inner }))
            .with_provider_timeout(Duration::from_secs(2));
        let app = router(state);

        let (status, body) = signup(&app, "b@x.com", "secret123").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "Error creating user: identity provider did not respond within 2s"
        );

        let (status, body) = send(&app, get_profile(Some(&format!("Bearer {token}")))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json_body(&body)["error"]
            .as_str()
            .unwrap()
            .starts_with("Error fetching user data: "));

        let request = Request::builder().uri("/health/ready").body(Body::empty()).unwrap();
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
