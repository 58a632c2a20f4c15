// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-process identity provider.
//!
//! Development and test double only: accounts and tokens live in memory and
//! passwords are compared in plain text. Rejection codes mirror the ones the
//! Firebase REST API returns so handlers see realistic messages.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CreatedIdentity, Credentials, IdentityClaims, IdentityProvider, ProviderError, ProviderInfo,
    SessionToken, SignedInIdentity, UserRecord,
};

const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);
const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    uid: String,
    email: String,
    password: String,
    created_at: chrono::DateTime<Utc>,
    last_login_at: Option<chrono::DateTime<Utc>>,
}

struct IssuedToken {
    uid: String,
    issued_at: i64,
    expires_at: i64,
}

#[derive(Default)]
struct Inner {
    /// Accounts keyed by lowercased email.
    accounts: HashMap<String, Account>,
    tokens: HashMap<String, IssuedToken>,
    /// Refresh handles live as long as the session token minted with them.
    refresh: HashMap<String, RefreshHandle>,
}

struct RefreshHandle {
    uid: String,
    expires_at: i64,
}

/// Identity provider backed by in-memory maps.
#[derive(Clone)]
pub struct InMemoryProvider {
    inner: Arc<RwLock<Inner>>,
    token_ttl: Duration,
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryProvider {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }

    /// Create with a custom token lifetime.
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Remove an account, leaving its outstanding tokens valid.
    pub async fn delete_user(&self, uid: &str) -> bool {
        let mut inner = self.inner.write().await;
        let before = inner.accounts.len();
        inner.accounts.retain(|_, account| account.uid != uid);
        inner.accounts.len() != before
    }

    fn mint(&self, inner: &mut Inner, uid: &str) -> SessionToken {
        let now = Utc::now().timestamp();
        inner.tokens.retain(|_, issued| issued.expires_at > now);
        inner.refresh.retain(|_, handle| handle.expires_at > now);

        let ttl = self.token_ttl.as_secs();
        let token = format!("mem.{}", Uuid::new_v4().simple());
        inner.tokens.insert(
            token.clone(),
            IssuedToken {
                uid: uid.to_string(),
                issued_at: now,
                expires_at: now + ttl as i64,
            },
        );
        SessionToken {
            token,
            expires_in: Some(ttl),
        }
    }
}

fn rejected(code: &str) -> ProviderError {
    ProviderError::Rejected {
        code: code.to_string(),
        message: code.to_string(),
    }
}

fn validate_email(email: &str) -> Result<(), ProviderError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(rejected("INVALID_EMAIL")),
    }
}

#[async_trait]
impl IdentityProvider for InMemoryProvider {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn create_identity(
        &self,
        credentials: &Credentials,
    ) -> Result<CreatedIdentity, ProviderError> {
        validate_email(&credentials.email)?;
        if credentials.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ProviderError::Rejected {
                code: "WEAK_PASSWORD".to_string(),
                message: "WEAK_PASSWORD : Password should be at least 6 characters".to_string(),
            });
        }

        let key = credentials.email.to_lowercase();
        let mut inner = self.inner.write().await;
        if inner.accounts.contains_key(&key) {
            return Err(rejected("EMAIL_EXISTS"));
        }

        let account = Account {
            uid: Uuid::new_v4().simple().to_string(),
            email: credentials.email.clone(),
            password: credentials.password.clone(),
            created_at: Utc::now(),
            last_login_at: None,
        };
        let created = CreatedIdentity {
            uid: account.uid.clone(),
            email: account.email.clone(),
        };
        inner.accounts.insert(key, account);
        Ok(created)
    }

    async fn verify_credential(
        &self,
        credentials: &Credentials,
    ) -> Result<SignedInIdentity, ProviderError> {
        let key = credentials.email.to_lowercase();
        let mut inner = self.inner.write().await;
        let (uid, email) = match inner.accounts.get_mut(&key) {
            Some(account) if account.password == credentials.password => {
                account.last_login_at = Some(Utc::now());
                (account.uid.clone(), account.email.clone())
            }
            _ => return Err(rejected("INVALID_LOGIN_CREDENTIALS")),
        };

        let id_token = self.mint(&mut inner, &uid).token;
        let refresh_token = Uuid::new_v4().simple().to_string();
        let expires_at = Utc::now().timestamp() + self.token_ttl.as_secs() as i64;
        inner.refresh.insert(
            refresh_token.clone(),
            RefreshHandle {
                uid: uid.clone(),
                expires_at,
            },
        );

        Ok(SignedInIdentity {
            uid,
            email,
            id_token,
            refresh_token,
        })
    }

    async fn issue_token(
        &self,
        identity: &SignedInIdentity,
    ) -> Result<SessionToken, ProviderError> {
        let mut inner = self.inner.write().await;
        let uid = match inner.refresh.get(&identity.refresh_token) {
            Some(handle) if handle.uid == identity.uid => handle.uid.clone(),
            _ => return Err(rejected("INVALID_REFRESH_TOKEN")),
        };
        Ok(self.mint(&mut inner, &uid))
    }

    async fn verify_token(&self, token: &str) -> Result<IdentityClaims, ProviderError> {
        let inner = self.inner.read().await;
        let issued = inner
            .tokens
            .get(token)
            .ok_or_else(|| ProviderError::InvalidToken("unknown token".to_string()))?;

        if issued.expires_at <= Utc::now().timestamp() {
            return Err(ProviderError::InvalidToken("token expired".to_string()));
        }

        let email = inner
            .accounts
            .values()
            .find(|account| account.uid == issued.uid)
            .map(|account| account.email.clone());

        Ok(IdentityClaims {
            uid: issued.uid.clone(),
            email,
            email_verified: false,
            sign_in_provider: Some("password".to_string()),
            issued_at: issued.issued_at,
            expires_at: issued.expires_at,
        })
    }

    async fn get_user(&self, uid: &str, _token: &str) -> Result<UserRecord, ProviderError> {
        let inner = self.inner.read().await;
        let account = inner
            .accounts
            .values()
            .find(|account| account.uid == uid)
            .ok_or(ProviderError::UserNotFound)?;

        Ok(UserRecord {
            uid: account.uid.clone(),
            email: Some(account.email.clone()),
            email_verified: false,
            display_name: None,
            photo_url: None,
            phone_number: None,
            disabled: false,
            created_at: Some(account.created_at),
            last_login_at: account.last_login_at,
            provider_data: vec![ProviderInfo {
                provider_id: "password".to_string(),
                uid: Some(account.email.clone()),
                email: Some(account.email.clone()),
                display_name: None,
            }],
        })
    }
}
