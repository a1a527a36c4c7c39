use std::time::Duration;

use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::adapters::auth::{Authenticator, HttpAuthenticator, TokenManager};
use crate::domain::decode::DecodeError;

pub const API_VERSION: &str = "v5";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("api request failed with status {status}: {body}")]
    Api { status: u16, body: String },
    #[error("network request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("failed to decode response: {0}")]
    Decode(#[from] DecodeError),
}

pub fn build_http_client(timeout: Duration) -> Result<Client, ClientError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(ClientError::Network)
}

/// `{base}/api/v5{path}`; a path component on the base URL is replaced, not extended.
pub fn api_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let origin = match base.find("://") {
        Some(scheme_end) => match base[scheme_end + 3..].find('/') {
            Some(path_start) => &base[..scheme_end + 3 + path_start],
            None => base,
        },
        None => base,
    };
    format!("{origin}/api/{API_VERSION}{path}")
}

/// Issues bearer-authenticated calls against the versioned API.
///
/// Every call first asks the token manager for a valid token. A token that expires while
/// the request is in flight is not retried; the resulting `Api` error (usually 401) is
/// returned to the caller. Dropping the returned future cancels the request.
pub struct HttpDispatcher<A = HttpAuthenticator> {
    client: Client,
    base_url: String,
    tokens: TokenManager<A>,
}

impl<A: Authenticator> HttpDispatcher<A> {
    pub fn new(client: Client, base_url: &str, tokens: TokenManager<A>) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenManager<A> {
        &self.tokens
    }

    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ClientError> {
        self.send::<Value>(Method::GET, path, query, None).await
    }

    pub async fn post<B>(&self, path: &str, body: &B) -> Result<Value, ClientError>
    where
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, path, &[], Some(body)).await
    }

    pub async fn put<B>(&self, path: &str, body: &B) -> Result<Value, ClientError>
    where
        B: Serialize + ?Sized,
    {
        self.send(Method::PUT, path, &[], Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ClientError> {
        self.send::<Value>(Method::DELETE, path, &[], None).await
    }

    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<Value, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let access_token = self.tokens.ensure_valid().await?;
        let url = api_url(&self.base_url, path);

        tracing::debug!(method = %method, path, "dispatching api request");

        let mut request = self
            .client
            .request(method.clone(), &url)
            .bearer_auth(access_token);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                method = %method,
                path,
                status = status.as_u16(),
                "api request rejected"
            );
            return Err(ClientError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|source| {
            ClientError::Decode(DecodeError::Shape {
                record: "response body",
                source,
            })
        })
    }
}
