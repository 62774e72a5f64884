use async_trait::async_trait;
use reqwest::cookie::Jar;
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::{error::ProviderError, models::IdentityClass, surfaces};

// 1. IdentityProvider Contract
/// IdentityProvider
///
/// The part of the remote identity provider this subsystem calls. Tokens are issued,
/// validated and refreshed on the provider's side; the only outbound call made
/// from here is the class-specific logout.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// logout
    ///
    /// Ends the session on the provider side. `cookie_header` is the caller's raw
    /// `Cookie` header, forwarded untouched so the provider can find its own HttpOnly
    /// credential. It is never parsed here.
    async fn logout(
        &self,
        class: IdentityClass,
        cookie_header: Option<String>,
    ) -> Result<(), ProviderError>;
}

/// ProviderState
///
/// Shared handle used in the application state and by the client lifecycle.
pub type ProviderState = Arc<dyn IdentityProvider>;

// 2. The Real Implementation (HTTP)
/// HttpIdentityProvider
///
/// Calls `POST {base_url}{logout_endpoint(class)}`. The request is bounded by the
/// configured timeout so a hung provider cannot pin a logout task forever.
#[derive(Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityProvider {
    /// Server-side client. Credentials are forwarded per call from the incoming
    /// request's `Cookie` header.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Self::build(reqwest::Client::builder().timeout(timeout), base_url)
    }

    /// with_cookie_store
    ///
    /// Client-side variant. The jar holds the provider's HttpOnly credential, set by
    /// the provider itself during login, and is attached to every call the way a
    /// browser sends credentials. This crate never reads the jar's contents.
    pub fn with_cookie_store(
        base_url: &str,
        timeout: Duration,
        jar: Arc<Jar>,
    ) -> Result<Self, ProviderError> {
        Self::build(
            reqwest::Client::builder().timeout(timeout).cookie_provider(jar),
            base_url,
        )
    }

    fn build(builder: reqwest::ClientBuilder, base_url: &str) -> Result<Self, ProviderError> {
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn logout_url(&self, class: IdentityClass) -> String {
        format!("{}{}", self.base_url, surfaces::logout_endpoint(class))
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn logout(
        &self,
        class: IdentityClass,
        cookie_header: Option<String>,
    ) -> Result<(), ProviderError> {
        let mut request = self.client.post(self.logout_url(class));
        if let Some(cookies) = cookie_header {
            request = request.header(reqwest::header::COOKIE, cookies);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

// 3. The Mock Implementation (For Tests)
/// MockIdentityProvider
///
/// Records every logout call. Can be told to fail, or to stall before answering so
/// tests can observe that local logout does not wait for the provider.
#[derive(Debug, Clone, Default)]
pub struct MockIdentityProvider {
    /// When true, every call fails with a simulated 500.
    pub should_fail: bool,
    /// Artificial latency applied before answering.
    pub delay: Option<Duration>,
    calls: Arc<Mutex<Vec<IdentityClass>>>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Classes for which a logout call has completed, in order.
    pub fn calls(&self) -> Vec<IdentityClass> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn logout(
        &self,
        class: IdentityClass,
        _cookie_header: Option<String>,
    ) -> Result<(), ProviderError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(class);
        }
        if self.should_fail {
            return Err(ProviderError::Status(500));
        }
        Ok(())
    }
}
