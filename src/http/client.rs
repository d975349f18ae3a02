//! Concrete [`Transport`] backends.
//!
//! Both backends wrap a `reqwest` client and share one send path and one
//! owned [`CookieJar`]; they differ only in the HTTP protocol version they
//! negotiate. [`build_transport`] performs the capability check once at
//! construction and returns the best backend that builds, so callers never
//! observe which one is active.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use reqwest::redirect;
use reqwest::Client;
use tracing::{debug, info, instrument, trace, warn};
use url::Url;

use super::jar::CookieJar;
use super::policy::CookieDomainPolicy;
use super::{HttpRequest, HttpResponse, Method, Transport, TransportConfig, TransportError};

/// Transport negotiating HTTP/2 via ALPN where the server supports it.
pub struct Http2Transport {
    core: ClientCore,
}

impl Http2Transport {
    /// Creates the HTTP/2-capable backend owning `jar`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ClientBuild`] when the underlying client
    /// cannot be constructed.
    pub fn new(jar: CookieJar, config: &TransportConfig) -> Result<Self, TransportError> {
        Ok(Self {
            core: ClientCore::build(jar, config, false)?,
        })
    }
}

#[async_trait]
impl Transport for Http2Transport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.core.send(request).await
    }

    fn clear_cookies(&self) {
        self.core.jar.clear();
    }
}

/// Transport pinned to HTTP/1.1, the compatibility fallback.
pub struct Http1Transport {
    core: ClientCore,
}

impl Http1Transport {
    /// Creates the HTTP/1.1-only backend owning `jar`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ClientBuild`] when the underlying client
    /// cannot be constructed.
    pub fn new(jar: CookieJar, config: &TransportConfig) -> Result<Self, TransportError> {
        Ok(Self {
            core: ClientCore::build(jar, config, true)?,
        })
    }
}

#[async_trait]
impl Transport for Http1Transport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.core.send(request).await
    }

    fn clear_cookies(&self) {
        self.core.jar.clear();
    }
}

/// Builds the best available transport backend.
///
/// Tries the HTTP/2-capable client first and falls back to HTTP/1.1 when
/// that build fails. The choice is made exactly once, here.
///
/// # Errors
///
/// Returns [`TransportError::ClientBuild`] when neither backend can be
/// constructed.
pub fn build_transport(
    policy: CookieDomainPolicy,
    config: &TransportConfig,
) -> Result<Box<dyn Transport>, TransportError> {
    match Http2Transport::new(CookieJar::new(policy.clone()), config) {
        Ok(transport) => {
            info!("using HTTP/2-capable transport");
            Ok(Box::new(transport))
        }
        Err(error) => {
            warn!(
                error = %error,
                "HTTP/2-capable client unavailable; falling back to HTTP/1.1 transport"
            );
            let transport = Http1Transport::new(CookieJar::new(policy), config)?;
            info!("using HTTP/1.1 transport");
            Ok(Box::new(transport))
        }
    }
}

/// Shared state and send path of both backends.
struct ClientCore {
    client: Client,
    jar: CookieJar,
}

impl ClientCore {
    fn build(
        jar: CookieJar,
        config: &TransportConfig,
        http1_only: bool,
    ) -> Result<Self, TransportError> {
        let mut builder = Client::builder()
            .redirect(redirect::Policy::none())
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .gzip(true);
        if http1_only {
            builder = builder.http1_only();
        }
        let client = builder
            .build()
            .map_err(|source| TransportError::ClientBuild { source })?;
        Ok(Self { client, jar })
    }

    #[instrument(level = "debug", skip(self, request), fields(uri = %request.uri))]
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = Url::parse(&request.uri)
            .map_err(|_| TransportError::invalid_url(&request.uri))?;
        let host = url
            .host_str()
            .ok_or_else(|| TransportError::invalid_url(&request.uri))?
            .to_string();

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };

        if request.method == Method::Post {
            builder = builder.header(CONTENT_TYPE, "application/x-www-form-urlencoded");
            if let Some(body) = &request.form_body {
                builder = builder.body(body.clone());
            }
        }

        // An explicit Cookie header overrides the jar for this request.
        let outgoing_cookies = match request.cookie_header.as_deref() {
            Some(header) if !header.is_empty() => Some(header.to_string()),
            Some(_) => None,
            None => self.jar.cookie_header_for(&host),
        };
        if let Some(header) = outgoing_cookies {
            builder = builder.header(COOKIE, header);
        }

        let response = builder.send().await.map_err(|error| {
            if error.is_timeout() {
                TransportError::timeout(&request.uri)
            } else {
                TransportError::network(&request.uri, error)
            }
        })?;

        let status = response.status().as_u16();
        let redirect_location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(ToString::to_string);

        for set_cookie in response.headers().get_all(SET_COOKIE) {
            if let Ok(raw) = set_cookie.to_str() {
                self.jar.store(&host, raw);
            }
        }

        let body = response
            .text()
            .await
            .map_err(|error| TransportError::network(&request.uri, error))?;
        let cookies = self.jar.cookies_for(&host);

        debug!(status, "received response");
        trace!(body_len = body.len(), "response body decoded");

        Ok(HttpResponse {
            status,
            body,
            cookies,
            redirect_location,
        })
    }
}
