use std::time::Duration;

use crate::adapters::auth::{Authenticator, HttpAuthenticator, TokenManager};
use crate::adapters::gateway::ChargePointGateway;
use crate::adapters::http::{ClientError, HttpDispatcher, build_http_client};
use crate::app::services::SessionFilterEngine;
use crate::domain::models::{Credential, SessionUser};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub credential: Credential,
    pub timeout: Duration,
}

type ReleaseHook = Box<dyn FnOnce() + Send>;

/// One authenticated connection to the cloud API.
///
/// Released exactly once: by `close`, or by `Drop` on any other exit path.
pub struct ClientSession<A: Authenticator = HttpAuthenticator> {
    gateway: ChargePointGateway<A>,
    release_hook: Option<ReleaseHook>,
    released: bool,
}

impl ClientSession<HttpAuthenticator> {
    /// Builds the connection resource and performs the initial login.
    pub async fn open(settings: &ClientSettings) -> Result<Self, ClientError> {
        let client = build_http_client(settings.timeout)?;
        let authenticator = HttpAuthenticator::new(client.clone(), &settings.base_url);
        let tokens = TokenManager::new(authenticator, settings.credential.clone());
        let dispatcher = HttpDispatcher::new(client, &settings.base_url, tokens);

        Self::start(ChargePointGateway::new(dispatcher)).await
    }
}

impl<A: Authenticator> ClientSession<A> {
    pub async fn start(gateway: ChargePointGateway<A>) -> Result<Self, ClientError> {
        let session = Self {
            gateway,
            release_hook: None,
            released: false,
        };
        session.gateway.dispatcher().tokens().ensure_valid().await?;

        tracing::info!("client session opened");
        Ok(session)
    }

    pub fn with_release_hook(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.release_hook = Some(Box::new(hook));
        self
    }

    pub fn gateway(&self) -> &ChargePointGateway<A> {
        &self.gateway
    }

    pub fn sessions(&self) -> SessionFilterEngine<'_, ChargePointGateway<A>> {
        SessionFilterEngine::new(&self.gateway)
    }

    pub async fn user(&self) -> Option<SessionUser> {
        self.gateway.dispatcher().tokens().session_user().await
    }

    pub async fn close(mut self) {
        self.gateway.dispatcher().tokens().discard().await;
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.gateway.dispatcher().tokens().try_discard();
        if let Some(hook) = self.release_hook.take() {
            hook();
        }
        tracing::info!("client session released");
    }
}

impl<A: Authenticator> Drop for ClientSession<A> {
    fn drop(&mut self) {
        self.release();
    }
}
