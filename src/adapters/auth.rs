use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::Client;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::adapters::http::{ClientError, api_url};
use crate::domain::decode::{DecodeError, decode_record};
use crate::domain::models::{Credential, SessionUser};
use crate::domain::token::{Clock, SystemClock, TokenGrant, TokenState};

/// Network side of authentication: exchanges a credential or a refresh token for a grant.
pub trait Authenticator: Send + Sync {
    fn login(
        &self,
        credential: &Credential,
    ) -> impl Future<Output = Result<TokenGrant, ClientError>> + Send;

    fn refresh(
        &self,
        credential: &Credential,
        access_token: &str,
        refresh_token: &str,
    ) -> impl Future<Output = Result<TokenGrant, ClientError>> + Send;
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    token: &'a str,
    refresh_token: &'a str,
}

#[derive(Debug, Clone)]
pub struct HttpAuthenticator {
    client: Client,
    base_url: String,
}

impl HttpAuthenticator {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    async fn post_grant<B: Serialize>(
        &self,
        path: &str,
        api_key: &str,
        body: &B,
    ) -> Result<TokenGrant, ClientError> {
        let response = self
            .client
            .post(api_url(&self.base_url, path))
            .header("apiKey", api_key)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let payload = serde_json::from_str(&text).map_err(|source| DecodeError::Shape {
            record: "token grant",
            source,
        })?;
        decode_record(payload).map_err(ClientError::from)
    }
}

impl Authenticator for HttpAuthenticator {
    async fn login(&self, credential: &Credential) -> Result<TokenGrant, ClientError> {
        let body = LoginRequest {
            email: &credential.email,
            password: &credential.password,
        };
        self.post_grant("/auth/login", &credential.api_key, &body)
            .await
    }

    async fn refresh(
        &self,
        credential: &Credential,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<TokenGrant, ClientError> {
        let body = RefreshRequest {
            token: access_token,
            refresh_token,
        };
        self.post_grant("/auth/refreshToken", &credential.api_key, &body)
            .await
    }
}

#[derive(Debug, Default)]
struct Guarded {
    tokens: TokenState,
    last_failure: Option<String>,
}

/// Owns the token state of one client and decides between reuse, refresh and login.
///
/// Renewal happens under an async mutex. `attempts` counts finished renewals, so a caller
/// that queued behind another caller's renewal takes over its outcome (the new token, or
/// the same authentication error) instead of issuing a second login or refresh.
pub struct TokenManager<A, C = SystemClock> {
    authenticator: A,
    credential: Credential,
    clock: C,
    state: Mutex<Guarded>,
    attempts: AtomicU64,
}

impl<A: Authenticator> TokenManager<A, SystemClock> {
    pub fn new(authenticator: A, credential: Credential) -> Self {
        Self::with_clock(authenticator, credential, SystemClock)
    }
}

impl<A: Authenticator, C: Clock> TokenManager<A, C> {
    pub fn with_clock(authenticator: A, credential: Credential, clock: C) -> Self {
        Self {
            authenticator,
            credential,
            clock,
            state: Mutex::new(Guarded::default()),
            attempts: AtomicU64::new(0),
        }
    }

    /// Returns a usable access token, refreshing or logging in when the advisory expiry
    /// has passed.
    pub async fn ensure_valid(&self) -> Result<String, ClientError> {
        let observed_attempts = self.attempts.load(Ordering::Acquire);
        let mut guarded = self.state.lock().await;

        if let Some(token) = guarded.tokens.access_token.as_ref()
            && guarded.tokens.is_fresh(self.clock.now())
        {
            return Ok(token.clone());
        }

        if self.attempts.load(Ordering::Acquire) != observed_attempts {
            if let Some(token) = guarded.tokens.access_token.as_ref() {
                return Ok(token.clone());
            }
            if let Some(reason) = guarded.last_failure.as_ref() {
                return Err(ClientError::Auth(reason.clone()));
            }
        }

        let outcome = self.renew(&mut guarded.tokens).await;
        self.attempts.fetch_add(1, Ordering::Release);

        match outcome {
            Ok(token) => {
                guarded.last_failure = None;
                Ok(token)
            }
            Err(reason) => {
                guarded.last_failure = Some(reason.clone());
                Err(ClientError::Auth(reason))
            }
        }
    }

    async fn renew(&self, tokens: &mut TokenState) -> Result<String, String> {
        if tokens.access_token.is_none() {
            tracing::info!("no access token held");
        } else {
            tracing::info!(expiry = tokens.expiry.0, "access token expired");
        }

        if let Some(refresh_token) = tokens.refresh_token.clone() {
            let access_token = tokens.access_token.clone().unwrap_or_default();
            tracing::info!("refresh token held, attempting refresh");
            match self
                .authenticator
                .refresh(&self.credential, &access_token, &refresh_token)
                .await
            {
                Ok(grant) => {
                    tokens.apply(grant);
                    tracing::debug!(expiry = tokens.expiry.0, "token refresh succeeded");
                    return Ok(tokens.access_token.clone().unwrap_or_default());
                }
                Err(error) => {
                    tracing::warn!(error = %error, "token refresh failed, falling back to login");
                    tokens.access_token = None;
                    tokens.refresh_token = None;
                }
            }
        }

        tracing::debug!("attempting login");
        match self.authenticator.login(&self.credential).await {
            Ok(grant) => {
                tokens.apply(grant);
                tracing::debug!(expiry = tokens.expiry.0, "login succeeded");
                Ok(tokens.access_token.clone().unwrap_or_default())
            }
            Err(error) => {
                tokens.clear();
                let reason = login_failure_reason(&error);
                tracing::error!(reason = %reason, "login failed");
                Err(reason)
            }
        }
    }

    pub async fn session_user(&self) -> Option<SessionUser> {
        self.state.lock().await.tokens.user.clone()
    }

    pub async fn discard(&self) {
        let mut guarded = self.state.lock().await;
        guarded.tokens.clear();
        guarded.last_failure = None;
    }

    /// Synchronous variant of `discard` for drop paths; skipped when a renewal holds the lock.
    pub fn try_discard(&self) -> bool {
        match self.state.try_lock() {
            Ok(mut guarded) => {
                guarded.tokens.clear();
                guarded.last_failure = None;
                true
            }
            Err(_) => false,
        }
    }
}

fn login_failure_reason(error: &ClientError) -> String {
    match error {
        ClientError::Api { status, .. } => format!("login rejected with status {status}"),
        ClientError::Network(error) => format!("login request failed: {error}"),
        ClientError::Decode(error) => format!("login response unusable: {error}"),
        ClientError::Auth(reason) => reason.clone(),
    }
}
