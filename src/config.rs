// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read once from the environment at startup (after an
//! optional `.env` file has been loaded by `main`).
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `FIREBASE_API_KEY` | Firebase web API key | Required |
//! | `FIREBASE_PROJECT_ID` | Firebase project id (token issuer/audience) | Required |
//! | `FIREBASE_AUTH_DOMAIN` | Firebase auth domain | Optional |
//! | `FIREBASE_STORAGE_BUCKET` | Firebase storage bucket | Optional |
//! | `FIREBASE_MESSAGING_SENDER_ID` | Firebase messaging sender id | Optional |
//! | `FIREBASE_APP_ID` | Firebase app id (sent as `X-Firebase-gmpid`) | Optional |
//! | `FIREBASE_IDENTITY_TOOLKIT_URL` | Identity Toolkit base URL | Google production |
//! | `FIREBASE_SECURE_TOKEN_URL` | Secure Token base URL | Google production |
//! | `FIREBASE_JWKS_URL` | ID token signing keys | Google securetoken JWKS |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3000` |
//! | `PROVIDER_TIMEOUT_SECS` | Upper bound for each identity provider call | `10` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; HTTPS when both are set | Unset |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const FIREBASE_API_KEY_ENV: &str = "FIREBASE_API_KEY";
pub const FIREBASE_PROJECT_ID_ENV: &str = "FIREBASE_PROJECT_ID";
pub const FIREBASE_AUTH_DOMAIN_ENV: &str = "FIREBASE_AUTH_DOMAIN";
pub const FIREBASE_STORAGE_BUCKET_ENV: &str = "FIREBASE_STORAGE_BUCKET";
pub const FIREBASE_MESSAGING_SENDER_ID_ENV: &str = "FIREBASE_MESSAGING_SENDER_ID";
pub const FIREBASE_APP_ID_ENV: &str = "FIREBASE_APP_ID";
pub const FIREBASE_IDENTITY_TOOLKIT_URL_ENV: &str = "FIREBASE_IDENTITY_TOOLKIT_URL";
pub const FIREBASE_SECURE_TOKEN_URL_ENV: &str = "FIREBASE_SECURE_TOKEN_URL";
pub const FIREBASE_JWKS_URL_ENV: &str = "FIREBASE_JWKS_URL";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const PROVIDER_TIMEOUT_ENV: &str = "PROVIDER_TIMEOUT_SECS";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const DEFAULT_SECURE_TOKEN_URL: &str = "https://securetoken.googleapis.com/v1";
const DEFAULT_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Firebase project settings.
#[derive(Clone)]
pub struct FirebaseConfig {
    pub api_key: String,
    pub project_id: String,
    pub auth_domain: Option<String>,
    pub storage_bucket: Option<String>,
    pub messaging_sender_id: Option<String>,
    pub app_id: Option<String>,
    pub identity_toolkit_url: String,
    pub secure_token_url: String,
    pub jwks_url: String,
}

impl std::fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("api_key", &"<redacted>")
            .field("project_id", &self.project_id)
            .field("auth_domain", &self.auth_domain)
            .field("storage_bucket", &self.storage_bucket)
            .field("messaging_sender_id", &self.messaging_sender_id)
            .field("app_id", &self.app_id)
            .field("identity_toolkit_url", &self.identity_toolkit_url)
            .field("secure_token_url", &self.secure_token_url)
            .field("jwks_url", &self.jwks_url)
            .finish()
    }
}

impl FirebaseConfig {
    /// Config for a project using Google's production endpoints.
    pub fn new(api_key: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            project_id: project_id.into(),
            auth_domain: None,
            storage_bucket: None,
            messaging_sender_id: None,
            app_id: None,
            identity_toolkit_url: DEFAULT_IDENTITY_TOOLKIT_URL.to_string(),
            secure_token_url: DEFAULT_SECURE_TOKEN_URL.to_string(),
            jwks_url: DEFAULT_JWKS_URL.to_string(),
        }
    }

    pub fn is_configured() -> bool {
        env_optional(FIREBASE_API_KEY_ENV).is_some()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_optional)
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));
        let or_default = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        Ok(Self {
            api_key: required(FIREBASE_API_KEY_ENV)?,
            project_id: required(FIREBASE_PROJECT_ID_ENV)?,
            auth_domain: lookup(FIREBASE_AUTH_DOMAIN_ENV),
            storage_bucket: lookup(FIREBASE_STORAGE_BUCKET_ENV),
            messaging_sender_id: lookup(FIREBASE_MESSAGING_SENDER_ID_ENV),
            app_id: lookup(FIREBASE_APP_ID_ENV),
            identity_toolkit_url: or_default(
                FIREBASE_IDENTITY_TOOLKIT_URL_ENV,
                DEFAULT_IDENTITY_TOOLKIT_URL,
            ),
            secure_token_url: or_default(FIREBASE_SECURE_TOKEN_URL_ENV, DEFAULT_SECURE_TOKEN_URL),
            jwks_url: or_default(FIREBASE_JWKS_URL_ENV, DEFAULT_JWKS_URL),
        })
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Certificate and key files for HTTPS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub provider_timeout: Duration,
    pub tls: Option<TlsPaths>,
    pub log_format: LogFormat,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_optional)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup(PORT_ENV) {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                name: PORT_ENV,
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let provider_timeout = match lookup(PROVIDER_TIMEOUT_ENV) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => {
                    return Err(ConfigError::Invalid {
                        name: PROVIDER_TIMEOUT_ENV,
                        reason: "must be at least 1 second".to_string(),
                    })
                }
                Ok(secs) => Duration::from_secs(secs),
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        name: PROVIDER_TIMEOUT_ENV,
                        reason: e.to_string(),
                    })
                }
            },
            None => DEFAULT_PROVIDER_TIMEOUT,
        };

        let tls = match (lookup(TLS_CERT_PATH_ENV), lookup(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing(TLS_KEY_PATH_ENV)),
            (None, Some(_)) => return Err(ConfigError::Missing(TLS_CERT_PATH_ENV)),
        };

        let log_format = match lookup(LOG_FORMAT_ENV).map(|v| v.to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            Some(v) if v == "pretty" => LogFormat::Pretty,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: LOG_FORMAT_ENV,
                    reason: format!("expected `json` or `pretty`, got `{other}`"),
                })
            }
            None => LogFormat::default(),
        };

        Ok(Self {
            host: lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            provider_timeout,
            tls,
            log_format,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: HOST_ENV,
                reason: e.to_string(),
            })
    }
}

/// Read an environment variable, treating blank values as unset.
pub fn env_optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
