use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::models::SessionUser;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct EpochSeconds(pub i64);

pub trait Clock: Send + Sync {
    fn now(&self) -> EpochSeconds;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> EpochSeconds {
        EpochSeconds(Utc::now().timestamp())
    }
}

/// Body of a successful `auth/login` or `auth/refreshToken` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrant {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<SessionUser>,
}

/// Authentication state of one client.
///
/// `expiry` is advisory: it is read from the access token's `exp` claim without any
/// signature check and only schedules renewal. `EpochSeconds(0)` means unknown/expired.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenState {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expiry: EpochSeconds,
    pub user: Option<SessionUser>,
}

impl TokenState {
    pub fn is_fresh(&self, now: EpochSeconds) -> bool {
        self.access_token.is_some() && self.expiry > now
    }

    pub fn apply(&mut self, grant: TokenGrant) {
        self.expiry = advisory_expiry(&grant.token);
        self.access_token = Some(grant.token);
        self.refresh_token = grant.refresh_token;
        if grant.user.is_some() {
            self.user = grant.user;
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Reads the `exp` claim from a JWT payload. No signature verification is performed.
/// Anything that cannot be read yields `EpochSeconds(0)`.
pub fn advisory_expiry(token: &str) -> EpochSeconds {
    let Some(payload) = token.split('.').nth(1) else {
        return EpochSeconds(0);
    };

    URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok())
        .and_then(|claims| claims.get("exp").and_then(Value::as_f64))
        .map(|exp| EpochSeconds(exp as i64))
        .unwrap_or_default()
}
