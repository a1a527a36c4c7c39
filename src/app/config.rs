use std::time::Duration;

use crate::adapters::client_session::ClientSettings;
use crate::app::AppError;
use crate::app::reports::ReportSettings;
use crate::domain::models::Credential;

pub const DEFAULT_BASE_URL: &str = "https://eapi.charge.space";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credential: Credential,
    pub base_url: String,
    pub price_per_kwh_cents: f64,
    pub connector_id: u32,
    pub http_timeout_secs: u64,
    pub http_bind: String,
}

impl AppConfig {
    /// Reads the process environment after loading a `.env` file when one exists.
    pub fn from_env() -> Result<Self, AppError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
            Err(error) if error.not_found() => {}
            Err(error) => return Err(AppError::config(error)),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let email = required(&lookup, "CHARGEAMPS_EMAIL")?;
        let password = required(&lookup, "CHARGEAMPS_PASSWORD")?;
        let api_key = required(&lookup, "CHARGEAMPS_API_KEY")?;

        let price_raw = required(&lookup, "CHARGEAMPS_PRICE_KWH")?;
        let price_per_kwh_cents = price_raw
            .parse::<f64>()
            .ok()
            .filter(|price| price.is_finite() && *price >= 0.0)
            .ok_or_else(|| {
                AppError::config("CHARGEAMPS_PRICE_KWH must be a non-negative number")
            })?;

        let base_url = optional(&lookup, "CHARGEAMPS_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.starts_with("http") {
            return Err(AppError::config(
                "CHARGEAMPS_BASE_URL must start with http:// or https://",
            ));
        }

        let connector_id = parse_or_default(&lookup, "CHARGEAMPS_CONNECTOR_ID", 1_u32)?;
        let http_timeout_secs = parse_or_default(&lookup, "HTTP_TIMEOUT_SECS", 30_u64)?;
        if http_timeout_secs == 0 {
            return Err(AppError::config("HTTP_TIMEOUT_SECS must be greater than 0"));
        }

        Ok(Self {
            credential: Credential::new(email, password, api_key),
            base_url,
            price_per_kwh_cents,
            connector_id,
            http_timeout_secs,
            http_bind: optional(&lookup, "HTTP_BIND")
                .unwrap_or_else(|| "127.0.0.1:8080".to_string()),
        })
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            credential: self.credential.clone(),
            timeout: Duration::from_secs(self.http_timeout_secs),
        }
    }

    pub fn report_settings(&self) -> ReportSettings {
        ReportSettings {
            connector_id: self.connector_id,
            price_per_kwh_cents: self.price_per_kwh_cents,
        }
    }
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required<F>(lookup: &F, key: &str) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).ok_or_else(|| AppError::config(format!("{key} is required")))
}

fn parse_or_default<T, F>(lookup: &F, key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr + Copy,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::config(format!("{key} must be a valid number"))),
        None => Ok(default),
    }
}
