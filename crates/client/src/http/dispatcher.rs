//! Request dispatch and the CSRF retry machine
//!
//! The dispatcher takes a [`Message`], resolves the effective session,
//! validates credentials before touching the network, rewrites the URL host
//! when the session configures a proxy, and sends the request on a pooled
//! transport client.
//!
//! Failed attempts may resend exactly once: when the message forces a retry,
//! or when the platform answers 403 to a state-changing request that still
//! allows the forbidden retry. The resend only fires if the failed response
//! carried a fresh CSRF token header; the token is written back into the
//! session so later requests start from it. The retry bound is the explicit
//! loop below, not a flag convention.

use std::sync::Arc;

use arcadia_domain::constants::{API_KEY_HEADER, CSRF_TOKEN_HEADER, SESSION_COOKIE_NAME};
use arcadia_domain::{ArcadiaError, AuthMode, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE};
use reqwest::{Client as ReqwestClient, Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use super::classify;
use super::pool::ClientPool;
use crate::config::ClientConfig;
use crate::message::Message;
use crate::session::{DefaultSessionProvider, Session};

/// Authenticated request pipeline for the platform API.
#[derive(Clone)]
pub struct Dispatcher {
    config: ClientConfig,
    pool: Arc<ClientPool>,
    default_provider: Option<Arc<dyn DefaultSessionProvider>>,
}

impl Dispatcher {
    /// Create a dispatcher with its own transport pool.
    pub fn new(config: ClientConfig) -> Self {
        config.log_config();
        let pool = Arc::new(ClientPool::new(&config));
        Self { config, pool, default_provider: None }
    }

    /// Install the fallback session provider consulted when a call passes no
    /// session, or passes one that fails the message's credential check.
    pub fn with_default_provider(mut self, provider: Arc<dyn DefaultSessionProvider>) -> Self {
        self.default_provider = Some(provider);
        self
    }

    /// Transport configuration this dispatcher was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Dispatch one message and classify the outcome.
    ///
    /// # Errors
    ///
    /// Credential preconditions fail before any network call. After dispatch,
    /// failure statuses surface as typed errors unless the message silences
    /// them, in which case the raw response comes back for caller-side
    /// inspection. Transport failures are raised regardless of silencing;
    /// there is no response to hand back.
    pub async fn send(
        &self,
        session: Option<&Arc<Session>>,
        mut message: Message,
    ) -> Result<Response> {
        let effective = self.resolve_session(session, &message).await?;

        let mut url = Url::parse(&message.url).map_err(|err| {
            ArcadiaError::InvalidRequest(format!("invalid request URL {}: {err}", message.url))
        })?;
        if let Some(proxy) = effective.as_ref().and_then(|resolved| resolved.proxy_host()) {
            rewrite_host(&mut url, proxy)?;
        }

        // Encoded once; the retry resends the identical bytes.
        let body = message.encode_body()?;

        let mut retried = false;
        let response = loop {
            let client = self.pool.acquire()?;
            let outcome =
                attempt(&client, &message, &url, effective.as_deref(), body.as_deref()).await;
            self.pool.release(client);

            let response = match outcome {
                Ok(response) => response,
                Err(err) => {
                    warn!(
                        op = message.label(),
                        method = %message.method,
                        url = %url,
                        error = %err,
                        "platform request failed in transport"
                    );
                    return Err(err);
                }
            };

            let status = response.status();
            debug!(
                op = message.label(),
                method = %message.method,
                url = %url,
                %status,
                "platform response received"
            );

            if !retried && !status.is_success() && wants_csrf_retry(&message, status) {
                if let Some(session) = effective.as_ref() {
                    if let Some(token) = csrf_header_value(&response) {
                        debug!(
                            op = message.label(),
                            %status,
                            "captured fresh CSRF token, resending once"
                        );
                        session.set_csrf_token(token);
                        message.disable_retry_on_forbidden();
                        retried = true;
                        continue;
                    }
                }
            }

            break response;
        };

        if message.silence_errors {
            return Ok(response);
        }
        classify::ensure_success(response).await
    }

    /// Dispatch and return the response body as text.
    pub async fn send_text(
        &self,
        session: Option<&Arc<Session>>,
        message: Message,
    ) -> Result<String> {
        let response = self.send(session, message).await?;
        response
            .text()
            .await
            .map_err(|err| ArcadiaError::Decode(format!("failed to read response body: {err}")))
    }

    /// Dispatch and decode the response body as JSON.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        session: Option<&Arc<Session>>,
        message: Message,
    ) -> Result<T> {
        let response = self.send(session, message).await?;
        response
            .json()
            .await
            .map_err(|err| ArcadiaError::Decode(format!("failed to decode response body: {err}")))
    }

    /// Pick the session the request will run under.
    ///
    /// The explicit argument wins when it satisfies the message. When it
    /// does not (or none was passed), the injected default provider may
    /// supply a fallback, which must satisfy the message too. A message with
    /// no credential requirements dispatches anonymously when no session is
    /// available at all.
    async fn resolve_session(
        &self,
        explicit: Option<&Arc<Session>>,
        message: &Message,
    ) -> Result<Option<Arc<Session>>> {
        let required = message.required_permission.as_deref();

        if let Some(session) = explicit {
            match session.authorize(message.auth_mode, required) {
                Ok(()) => return Ok(Some(Arc::clone(session))),
                Err(primary) => {
                    if let Some(provider) = &self.default_provider {
                        if let Some(fallback) = provider.default_session().await {
                            if fallback.authorize(message.auth_mode, required).is_ok() {
                                debug!(
                                    op = message.label(),
                                    "explicit session failed validation, using default provider session"
                                );
                                return Ok(Some(fallback));
                            }
                        }
                    }
                    return Err(primary);
                }
            }
        }

        if let Some(provider) = &self.default_provider {
            if let Some(session) = provider.default_session().await {
                session.authorize(message.auth_mode, required)?;
                return Ok(Some(session));
            }
        }

        match message.auth_mode {
            AuthMode::None => Ok(None),
            AuthMode::ApiKey => Err(ArcadiaError::ApiKeyRequired(format!(
                "no session supplied for an {} request",
                message.auth_mode
            ))),
            AuthMode::Cookie | AuthMode::CookieAndApiKey => {
                Err(ArcadiaError::AuthRequired(format!(
                    "no session supplied for a {} request",
                    message.auth_mode
                )))
            }
        }
    }
}

async fn attempt(
    client: &ReqwestClient,
    message: &Message,
    url: &Url,
    session: Option<&Session>,
    body: Option<&str>,
) -> Result<Response> {
    let headers = build_headers(message, body.is_some(), session)?;

    let mut request = client.request(message.method.clone(), url.clone()).headers(headers);
    if let Some(body) = body {
        request = request.body(body.to_owned());
    }

    request
        .send()
        .await
        .map_err(|err| ArcadiaError::Transport(format!("request to {url} failed: {err}")))
}

/// Assemble headers in the platform's required order: content headers,
/// then the message's own (first occurrence wins, never overwriting),
/// then cookie, CSRF token, and API key appended last.
fn build_headers(message: &Message, has_body: bool, session: Option<&Session>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    if has_body {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    for (name, value) in &message.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
            ArcadiaError::InvalidRequest(format!("invalid header name `{name}`: {err}"))
        })?;
        if headers.contains_key(&header_name) {
            continue;
        }
        let header_value = HeaderValue::from_str(value).map_err(|err| {
            ArcadiaError::InvalidRequest(format!("invalid value for header `{name}`: {err}"))
        })?;
        headers.insert(header_name, header_value);
    }

    let Some(session) = session else {
        return Ok(headers);
    };

    if let Some(cookie) = session.cookie() {
        let value =
            HeaderValue::from_str(&format!("{SESSION_COOKIE_NAME}={cookie}")).map_err(|err| {
                ArcadiaError::InvalidRequest(format!(
                    "session cookie is not a valid header value: {err}"
                ))
            })?;
        headers.append(COOKIE, value);
    }

    if let Some(token) = session.csrf_token() {
        let value = HeaderValue::from_str(&token).map_err(|err| {
            ArcadiaError::InvalidRequest(format!(
                "CSRF token is not a valid header value: {err}"
            ))
        })?;
        headers.append(HeaderName::from_static(CSRF_TOKEN_HEADER), value);
    }

    if let Some(api_key) = session.api_key() {
        let value = HeaderValue::from_str(api_key).map_err(|err| {
            ArcadiaError::InvalidRequest(format!("API key is not a valid header value: {err}"))
        })?;
        headers.append(HeaderName::from_static(API_KEY_HEADER), value);
    }

    Ok(headers)
}

/// Retry trigger: a forced retry pairs with any failed status; the
/// forbidden path needs 403, an intact retry flag, and a state-changing
/// method.
fn wants_csrf_retry(message: &Message, status: StatusCode) -> bool {
    if message.force_retry {
        return true;
    }
    status == StatusCode::FORBIDDEN && message.retry_on_forbidden && message.method != Method::GET
}

fn csrf_header_value(response: &Response) -> Option<String> {
    response
        .headers()
        .get(CSRF_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

fn rewrite_host(url: &mut Url, proxy_host: &str) -> Result<()> {
    url.set_host(Some(proxy_host)).map_err(|err| {
        ArcadiaError::InvalidRequest(format!("invalid proxy host `{proxy_host}`: {err}"))
    })
}
