//! Request descriptions
//!
//! A [`Message`] describes one logical platform request: method, URL, body,
//! extra headers, the credentials it requires, and its retry/silence policy.
//! Messages are built fluently and handed to the dispatcher by value; the
//! only field the dispatcher mutates is the forbidden-retry flag, cleared
//! when the single CSRF retry fires.

use arcadia_domain::{ArcadiaError, AuthMode, Result};
use reqwest::Method;
use serde::Serialize;

/// Request body variants.
///
/// `Raw` bypasses JSON encoding and is sent byte-for-byte; both variants are
/// announced to the platform as JSON content.
#[derive(Debug, Clone)]
pub enum Payload {
    None,
    Json(serde_json::Value),
    Raw(String),
}

/// One logical request against the platform.
#[derive(Debug, Clone)]
pub struct Message {
    pub(crate) method: Method,
    pub(crate) url: String,
    pub(crate) payload: Payload,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) auth_mode: AuthMode,
    pub(crate) retry_on_forbidden: bool,
    pub(crate) force_retry: bool,
    pub(crate) silence_errors: bool,
    pub(crate) name: Option<String>,
    pub(crate) required_permission: Option<String>,
}

impl Message {
    /// Describe a request with an explicit method.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            payload: Payload::None,
            headers: Vec::new(),
            auth_mode: AuthMode::default(),
            retry_on_forbidden: true,
            force_retry: false,
            silence_errors: false,
            name: None,
            required_permission: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` when the value cannot be serialized.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body).map_err(|err| {
            ArcadiaError::InvalidRequest(format!("failed to serialize request body: {err}"))
        })?;
        self.payload = Payload::Json(value);
        Ok(self)
    }

    /// Attach a pre-encoded body, sent verbatim.
    pub fn raw_body(mut self, body: impl Into<String>) -> Self {
        self.payload = Payload::Raw(body.into());
        self
    }

    /// Add a header. Headers keep their insertion order and never overwrite
    /// headers the dispatcher has already set.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Declare the credentials this request requires.
    pub fn auth(mut self, mode: AuthMode) -> Self {
        self.auth_mode = mode;
        self
    }

    /// Name the request for logs and diagnostics.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Declare an API-key permission this request needs.
    pub fn require_permission(mut self, permission: impl Into<String>) -> Self {
        self.required_permission = Some(permission.into());
        self
    }

    /// Return the raw response instead of classifying failure statuses.
    pub fn silence_errors(mut self) -> Self {
        self.silence_errors = true;
        self
    }

    /// Take the CSRF retry path after any failed response, not just 403.
    pub fn force_retry(mut self) -> Self {
        self.force_retry = true;
        self
    }

    /// Opt out of the 403-driven CSRF retry.
    pub fn no_retry_on_forbidden(mut self) -> Self {
        self.retry_on_forbidden = false;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn auth_mode(&self) -> AuthMode {
        self.auth_mode
    }

    /// Diagnostic label for logs.
    pub(crate) fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("request")
    }

    /// Encode the body once; the encoding is reused verbatim on the retry.
    pub(crate) fn encode_body(&self) -> Result<Option<String>> {
        match &self.payload {
            Payload::None => Ok(None),
            Payload::Raw(body) => Ok(Some(body.clone())),
            Payload::Json(value) => serde_json::to_string(value).map(Some).map_err(|err| {
                ArcadiaError::InvalidRequest(format!("failed to encode request body: {err}"))
            }),
        }
    }

    pub(crate) fn disable_retry_on_forbidden(&mut self) {
        self.retry_on_forbidden = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_allow_forbidden_retry_and_surface_errors() {
        let message = Message::get("https://users.arcadia.example/v1/users/1");
        assert_eq!(message.method(), &Method::GET);
        assert_eq!(message.auth_mode(), AuthMode::None);
        assert!(message.retry_on_forbidden);
        assert!(!message.force_retry);
        assert!(!message.silence_errors);
        assert!(message.name.is_none());
        assert!(matches!(message.payload, Payload::None));
    }

    #[test]
    fn json_body_encodes_once() {
        let message = Message::post("https://economy.arcadia.example/v1/purchases")
            .json(&serde_json::json!({ "assetId": 7, "price": 50 }))
            .unwrap();

        let body = message.encode_body().unwrap().unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["assetId"], 7);
        assert_eq!(parsed["price"], 50);
    }

    #[test]
    fn raw_body_is_kept_verbatim() {
        let message = Message::post("https://forums.arcadia.example/v1/posts")
            .raw_body("{\"exact\":  \"bytes\"}");

        let body = message.encode_body().unwrap().unwrap();
        assert_eq!(body, "{\"exact\":  \"bytes\"}");
    }

    #[test]
    fn headers_keep_insertion_order() {
        let message = Message::get("https://users.arcadia.example/v1/users/1")
            .header("x-first", "1")
            .header("x-second", "2");

        assert_eq!(message.headers[0].0, "x-first");
        assert_eq!(message.headers[1].0, "x-second");
    }

    #[test]
    fn label_falls_back_when_unnamed() {
        let unnamed = Message::get("https://users.arcadia.example/v1/users/1");
        assert_eq!(unnamed.label(), "request");

        let named = Message::get("https://users.arcadia.example/v1/users/1").named("fetch user");
        assert_eq!(named.label(), "fetch user");
    }
}
