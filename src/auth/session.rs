//! Session management: the three-step login protocol, the validity probe,
//! and the cache-or-refresh decision.
//!
//! Acquiring the signed tile cookies is a 3-step process:
//! 1. Retrieve the CSRF token from the login form.
//! 2. Post the form with the CSRF token together with the user email and
//!    password.
//! 3. After successful authentication, retrieve the session cookies from
//!    the tile-authorization endpoint.
//!
//! The serialized cookie header is stored in the settings store and reused
//! as long as the validity probe accepts it; once it expires the whole
//! process runs again and the stored value is replaced.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::http::{HttpRequest, Transport, TransportError};
use crate::settings::SettingsStore;

use super::csrf::extract_csrf_token;
use super::error::{AuthError, SessionError};

/// Settings key holding the account email.
pub const EMAIL_KEY: &str = "strava.heatmap.email";
/// Settings key holding the account password.
pub const PASSWORD_KEY: &str = "strava.heatmap.password";
/// Settings key holding the cached session-cookie header.
pub const SESSION_COOKIES_KEY: &str = "strava.heatmap.cookies";

/// Name prefix identifying the signed tile cookies among everything else
/// the site sets.
pub const SIGNING_COOKIE_PREFIX: &str = "CloudFront";

/// The fixed endpoints of the login protocol.
///
/// Injectable so tests can point the protocol at a mock server; the
/// default is the production site.
#[derive(Debug, Clone)]
pub struct Endpoints {
    /// Login form page (GET).
    pub login_form_url: String,
    /// Login form submission target (POST).
    pub session_url: String,
    /// Post-login redirect target for established accounts.
    pub dashboard_url: String,
    /// Post-login redirect target for fresh accounts.
    pub onboarding_url: String,
    /// Tile-authorization endpoint that sets the signing cookies (GET).
    pub tile_auth_url: String,
    /// Arbitrary representative tile used by the validity probe (GET).
    pub probe_tile_url: String,
}

impl Endpoints {
    /// Builds the endpoint set from an account-site base URL and a
    /// tile-server base URL (both without trailing slash).
    #[must_use]
    pub fn rooted_at(account_base: &str, tile_base: &str) -> Self {
        Self {
            login_form_url: format!("{account_base}/login"),
            session_url: format!("{account_base}/session"),
            dashboard_url: format!("{account_base}/dashboard"),
            onboarding_url: format!("{account_base}/onboarding"),
            tile_auth_url: format!("{tile_base}/auth"),
            probe_tile_url: format!("{tile_base}/tiles-auth/winter/bluered/9/256/255"),
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::rooted_at(
            "https://www.strava.com",
            "https://heatmap-external-a.strava.com",
        )
    }
}

/// Acquires, caches, and renews the session-cookie header.
///
/// The only stateful component of the crate: state lives in the settings
/// store (cached header) and the transport's cookie jar. Concurrent
/// callers hitting a cold or expired cache are serialized so only one
/// login submission reaches the site.
pub struct SessionManager {
    transport: Box<dyn Transport>,
    settings: Arc<dyn SettingsStore>,
    endpoints: Endpoints,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl SessionManager {
    /// Creates a session manager over the given transport and settings.
    pub fn new(
        transport: Box<dyn Transport>,
        settings: Arc<dyn SettingsStore>,
        endpoints: Endpoints,
    ) -> Self {
        Self {
            transport,
            settings,
            endpoints,
            refresh_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Returns the session cookies formatted as an HTTP `Cookie` header.
    ///
    /// A cached header that still probes valid is reused; otherwise the
    /// login protocol runs and the freshly harvested header replaces the
    /// cached one.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Auth`] when credentials are missing or the
    /// site rejects them, [`SessionError::Transport`] when the network or
    /// the site misbehaves.
    #[instrument(level = "debug", skip(self))]
    pub async fn get_session_header(&self) -> Result<String, SessionError> {
        let initial = self.settings.get(SESSION_COOKIES_KEY).unwrap_or_default();
        if self.is_valid(&initial).await? {
            debug!("reusing cached session header");
            return Ok(initial);
        }

        let _refresh = self.refresh_lock.lock().await;
        // A concurrent caller may have refreshed while we waited for the
        // lock; only a header that changed since the first read is worth
        // probing again.
        let current = self.settings.get(SESSION_COOKIES_KEY).unwrap_or_default();
        if current != initial && self.is_valid(&current).await? {
            debug!("session header refreshed by concurrent caller");
            return Ok(current);
        }

        info!("session header missing or expired; authenticating");
        self.logon().await?;
        let header = self.retrieve_signing_cookies().await?;
        self.settings.put(SESSION_COOKIES_KEY, &header);
        info!("stored refreshed session header");
        Ok(header)
    }

    /// Returns the session cookies re-serialized as URL query parameters
    /// (`?name=value&name=value`, values percent-encoded).
    ///
    /// Tile layers cannot be configured with a custom request header, so
    /// the cookies ride along as query parameters instead.
    ///
    /// # Errors
    ///
    /// Same as [`get_session_header`](Self::get_session_header).
    pub async fn session_query_params(&self) -> Result<String, SessionError> {
        let header = self.get_session_header().await?;
        Ok(header_to_query_params(&header))
    }

    /// Tests whether `header` still authorizes tile access.
    ///
    /// Downloads an arbitrary representative tile with `header` as the
    /// outgoing `Cookie`. 200 means valid, 403 means expired. An empty
    /// header is invalid by definition and probed without a request.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::ProbeFailed`] (wrapped) for any other
    /// status, or the transport's own error on I/O failure.
    #[instrument(level = "debug", skip(self, header))]
    pub async fn is_valid(&self, header: &str) -> Result<bool, SessionError> {
        if header.is_empty() {
            return Ok(false);
        }
        debug!(url = %self.endpoints.probe_tile_url, "checking authentication status");
        let request =
            HttpRequest::get(&self.endpoints.probe_tile_url).with_cookie_header(header);
        let response = self.transport.send(&request).await?;
        match response.status {
            200 => Ok(true),
            403 => Ok(false),
            status => Err(TransportError::probe_failed(status).into()),
        }
    }

    /// Removes all cookies from the transport's jar. Useful for tests.
    pub fn clear_cookies(&self) {
        self.transport.clear_cookies();
    }

    /// Logs on to the website by submitting the HTML login form.
    ///
    /// Upon success the server redirects to either the dashboard or the
    /// onboarding page; a redirect back to the login form means the
    /// credentials were rejected.
    async fn logon(&self) -> Result<(), SessionError> {
        let email = self
            .settings
            .get(EMAIL_KEY)
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::EmailNotSet)?;
        let password = self
            .settings
            .get(PASSWORD_KEY)
            .filter(|value| !value.is_empty())
            .ok_or(AuthError::PasswordNotSet)?;

        let csrf_token = self.retrieve_csrf_token().await?;
        let form_body = build_login_form_body(&email, &password, &csrf_token);

        let request = HttpRequest::post(&self.endpoints.session_url, form_body);
        let response = self.transport.send(&request).await?;

        if response.status != 302 {
            return Err(TransportError::unexpected_status(response.status).into());
        }
        let location = response.redirect_location.unwrap_or_default();
        if location == self.endpoints.login_form_url {
            return Err(AuthError::Rejected.into());
        }
        if location != self.endpoints.dashboard_url && location != self.endpoints.onboarding_url {
            return Err(TransportError::unexpected_redirect(location).into());
        }
        info!("login form accepted");
        Ok(())
    }

    /// Retrieves the CSRF token from the HTML login form. A valid token is
    /// required for submitting the form.
    async fn retrieve_csrf_token(&self) -> Result<String, SessionError> {
        let request = HttpRequest::get(&self.endpoints.login_form_url);
        let response = self.transport.send(&request).await?;
        let token = extract_csrf_token(&response.body);
        if token.is_empty() {
            return Err(TransportError::CsrfTokenMissing.into());
        }
        Ok(token.to_string())
    }

    /// Retrieves the signing cookies from the tile-authorization endpoint.
    /// Must run after a successful [`logon`](Self::logon).
    async fn retrieve_signing_cookies(&self) -> Result<String, SessionError> {
        let request = HttpRequest::get(&self.endpoints.tile_auth_url);
        let response = self.transport.send(&request).await?;

        let header = response
            .cookies
            .iter()
            .filter(|(name, _)| name.starts_with(SIGNING_COOKIE_PREFIX))
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(";");

        if header.is_empty() {
            warn!("tile-authorization endpoint set no signing cookies");
        } else {
            debug!(
                cookie_count = header.matches('=').count(),
                "harvested signing cookies"
            );
        }
        Ok(header)
    }
}

/// Builds the URL-encoded login form body.
///
/// The field set and order are what the site's form validation expects,
/// including the literal UTF-8 checkmark sentinel and the empty `plan`
/// field.
fn build_login_form_body(email: &str, password: &str, csrf_token: &str) -> String {
    format!(
        "email={}&password={}&authenticity_token={}&utf8={}&plan=",
        urlencoding::encode(email),
        urlencoding::encode(password),
        urlencoding::encode(csrf_token),
        urlencoding::encode("\u{2713}"),
    )
}

/// Re-serializes a `name=value;name=value` cookie header as URL query
/// parameters with percent-encoded values.
fn header_to_query_params(header: &str) -> String {
    let pairs = header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>();
    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}
