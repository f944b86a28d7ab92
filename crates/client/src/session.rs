//! Session credentials and the default-session seam
//!
//! A [`Session`] bundles one caller identity: the platform session cookie,
//! an optional API key with its granted permissions, an optional proxy host,
//! and the rotating CSRF token. Everything except the CSRF slot is fixed at
//! construction; the dispatcher's retry path is the only writer of the slot.
//!
//! Sessions are shared across requests and tasks as `Arc<Session>`. When two
//! requests on one session race into a CSRF refresh, both writes are legal
//! and the last one wins; callers must not rely on the slot being
//! linearizable.

use std::fmt;
use std::sync::Arc;

use arcadia_domain::{ArcadiaError, AuthMode, Result};
use async_trait::async_trait;
use parking_lot::RwLock;

/// One caller identity against the platform.
pub struct Session {
    cookie: Option<String>,
    api_key: Option<String>,
    permissions: Vec<String>,
    proxy_host: Option<String>,
    csrf_token: RwLock<Option<String>>,
}

impl Session {
    /// Start building a new session.
    pub fn builder() -> SessionBuilder {
        SessionBuilder::default()
    }

    /// Convenience constructor for the common cookie-only session.
    pub fn from_cookie(cookie: impl Into<String>) -> Arc<Self> {
        Self::builder().cookie(cookie).build()
    }

    /// The platform session cookie value, when present.
    pub fn cookie(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    /// The long-lived API key, when present.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Permissions granted to the API key.
    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    /// Whether the API key was granted the named permission.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|granted| granted == permission)
    }

    /// Host that platform requests should be rewritten to, when configured.
    pub fn proxy_host(&self) -> Option<&str> {
        self.proxy_host.as_deref()
    }

    /// Current CSRF token, when one has been captured.
    pub fn csrf_token(&self) -> Option<String> {
        self.csrf_token.read().clone()
    }

    /// Store a fresh CSRF token. Written by the dispatcher's retry path;
    /// concurrent writers are last-write-wins.
    pub fn set_csrf_token(&self, token: impl Into<String>) {
        *self.csrf_token.write() = Some(token.into());
    }

    /// Check this session against a message's credential requirements.
    ///
    /// Runs before any network call. The permission check applies to the
    /// modes that require an API key, since permissions are properties of
    /// the key grant.
    ///
    /// # Errors
    ///
    /// `AuthRequired` when the mode needs a cookie this session lacks;
    /// `ApiKeyRequired` when it needs a key or a permission this session
    /// lacks.
    pub fn authorize(&self, mode: AuthMode, required_permission: Option<&str>) -> Result<()> {
        if mode.needs_cookie() && self.cookie.is_none() {
            return Err(ArcadiaError::AuthRequired(format!(
                "a session cookie is required for {mode} requests"
            )));
        }

        if mode.needs_api_key() {
            if self.api_key.is_none() {
                return Err(ArcadiaError::ApiKeyRequired(format!(
                    "an API key is required for {mode} requests"
                )));
            }
            if let Some(permission) = required_permission {
                if !self.has_permission(permission) {
                    return Err(ArcadiaError::ApiKeyRequired(format!(
                        "the API key is missing the `{permission}` permission"
                    )));
                }
            }
        }

        Ok(())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("cookie", &self.cookie.as_deref().map(|_| "<redacted>"))
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("permissions", &self.permissions)
            .field("proxy_host", &self.proxy_host)
            .field("csrf_token", &self.csrf_token.read().as_deref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Builder for [`Session`].
#[derive(Debug, Default)]
pub struct SessionBuilder {
    cookie: Option<String>,
    api_key: Option<String>,
    permissions: Vec<String>,
    proxy_host: Option<String>,
}

impl SessionBuilder {
    pub fn cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Record a permission granted to the API key.
    pub fn grant_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    /// Route platform requests through the given host instead of the URL's
    /// own host.
    pub fn proxy_host(mut self, host: impl Into<String>) -> Self {
        self.proxy_host = Some(host.into());
        self
    }

    pub fn build(self) -> Arc<Session> {
        Arc::new(Session {
            cookie: self.cookie,
            api_key: self.api_key,
            permissions: self.permissions,
            proxy_host: self.proxy_host,
            csrf_token: RwLock::new(None),
        })
    }
}

/// Supplier of the process-wide fallback session.
///
/// The dispatcher consults this when a call passes no session, or passes one
/// that fails the message's credential check. Injected explicitly; the
/// dispatcher never reaches into global state.
#[async_trait]
pub trait DefaultSessionProvider: Send + Sync {
    /// The fallback session, or `None` when the process has none to offer.
    async fn default_session(&self) -> Option<Arc<Session>>;
}

/// Trivial provider that always hands out the same session.
pub struct StaticSessionProvider {
    session: Arc<Session>,
}

impl StaticSessionProvider {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl DefaultSessionProvider for StaticSessionProvider {
    async fn default_session(&self) -> Option<Arc<Session>> {
        Some(Arc::clone(&self.session))
    }
}
