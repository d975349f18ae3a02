//! HTTP transport abstraction for the login protocol.
//!
//! The session manager talks to the website through the [`Transport`]
//! trait: one request in, one response out, no redirect following, with a
//! domain-aware cookie jar owned by the transport instance. Two concrete
//! backends exist ([`Http2Transport`] and [`Http1Transport`]);
//! [`build_transport`] picks the best one available at construction time.

mod client;
mod error;
mod jar;
mod policy;

pub use client::{Http1Transport, Http2Transport, build_transport};
pub use error::TransportError;
pub use jar::CookieJar;
pub use policy::CookieDomainPolicy;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

/// Default connect/request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

/// HTTP method. Only the two verbs the login protocol uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET request.
    Get,
    /// POST request with a URL-form-encoded body.
    Post,
}

/// An immutable request handed to a [`Transport`].
#[derive(Clone)]
pub struct HttpRequest {
    /// Absolute request URI.
    pub uri: String,
    /// HTTP method.
    pub method: Method,
    /// Explicit outgoing `Cookie` header. When set, it replaces whatever
    /// the transport's jar would attach for this request.
    pub cookie_header: Option<String>,
    /// URL-form-encoded body, POST only.
    pub form_body: Option<String>,
}

impl HttpRequest {
    /// Creates a GET request.
    pub fn get(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            method: Method::Get,
            cookie_header: None,
            form_body: None,
        }
    }

    /// Creates a POST request carrying a URL-form-encoded body.
    pub fn post(uri: impl Into<String>, form_body: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            method: Method::Post,
            cookie_header: None,
            form_body: Some(form_body.into()),
        }
    }

    /// Sets an explicit outgoing `Cookie` header.
    #[must_use]
    pub fn with_cookie_header(mut self, header: impl Into<String>) -> Self {
        self.cookie_header = Some(header.into());
        self
    }
}

// Custom Debug impl: the form body carries the password and the cookie
// header carries session secrets.
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("uri", &self.uri)
            .field("method", &self.method)
            .field("cookie_header", &self.cookie_header.as_ref().map(|_| "[REDACTED]"))
            .field("form_body", &self.form_body.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// An immutable response returned by a [`Transport`].
#[derive(Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body decoded as text.
    pub body: String,
    /// Cookies visible for the request's host after the exchange, as
    /// `(name, value)` pairs in the order they were first encountered.
    pub cookies: Vec<(String, String)>,
    /// Raw `Location` header, present on redirect responses.
    pub redirect_location: Option<String>,
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("body_len", &self.body.len())
            .field("cookie_count", &self.cookies.len())
            .field("redirect_location", &self.redirect_location)
            .finish()
    }
}

/// Transport configuration.
#[derive(Debug, Clone, Copy)]
pub struct TransportConfig {
    /// Connect and request timeout.
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Sends one HTTP request and returns the resulting exchange.
///
/// Implementations must not follow redirects (the `Location` header and
/// status 302 are protocol signals inspected by the caller) and must run
/// every received `Set-Cookie` header through their cookie jar's domain
/// policy.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the response.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] on I/O failure, timeout, or a
    /// non-parseable response.
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Removes all cookies from the transport's jar.
    fn clear_cookies(&self);
}
