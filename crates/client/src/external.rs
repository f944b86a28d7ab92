//! Scoped external client
//!
//! Escape hatch for hosts outside the platform API surface (CDN endpoints,
//! auxiliary services) that still expect the caller's session cookie. The
//! client is pinned to one base URI at construction and sends the cookie
//! and nothing else: no CSRF header, no API key, no retry machine, no
//! classification. Callers inspect the raw response themselves.

use std::sync::Arc;

use arcadia_domain::constants::SESSION_COOKIE_NAME;
use arcadia_domain::{ArcadiaError, Result};
use reqwest::header::COOKIE;
use reqwest::{Client as ReqwestClient, Response};
use url::Url;

use crate::config::ClientConfig;
use crate::session::Session;

/// Cookie-only client for one fixed base URI.
#[derive(Debug)]
pub struct ScopedClient {
    base: String,
    session: Arc<Session>,
    client: ReqwestClient,
}

impl ScopedClient {
    /// Bind a client to `base_uri` with its own minimal transport.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` when the base URI does not parse; `Config` when the
    /// transport client cannot be constructed.
    pub fn new(
        base_uri: impl Into<String>,
        session: Arc<Session>,
        config: &ClientConfig,
    ) -> Result<Self> {
        let base = base_uri.into();
        Url::parse(&base).map_err(|err| {
            ArcadiaError::InvalidRequest(format!("invalid base URI `{base}`: {err}"))
        })?;

        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .no_proxy()
            .build()
            .map_err(|err| {
                ArcadiaError::Config(format!("failed to build transport client: {err}"))
            })?;

        Ok(Self { base, session, client })
    }

    /// GET `path` under the base URI with only the session cookie attached.
    ///
    /// The response comes back unclassified, whatever its status.
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = self.url_for(path)?;

        let mut request = self.client.get(url.clone());
        if let Some(cookie) = self.session.cookie() {
            request = request.header(COOKIE, format!("{SESSION_COOKIE_NAME}={cookie}"));
        }

        request
            .send()
            .await
            .map_err(|err| ArcadiaError::Transport(format!("request to {url} failed: {err}")))
    }

    fn url_for(&self, path: &str) -> Result<Url> {
        let joined =
            format!("{}/{}", self.base.trim_end_matches('/'), path.trim_start_matches('/'));
        Url::parse(&joined).map_err(|err| {
            ArcadiaError::InvalidRequest(format!("invalid request path `{path}`: {err}"))
        })
    }
}
