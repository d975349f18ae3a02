//! Error types for the HTTP transport and the login protocol's
//! transport-level failures.

use thiserror::Error;

/// Errors raised by the transport or by protocol steps that indicate the
/// remote site misbehaved (as opposed to the credentials being wrong).
///
/// All variants are potentially transient; callers may retry later.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error sending request to {url}: {source}")]
    Network {
        /// The URL the request was sent to.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout sending request to {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// The provided URL is malformed or has no host.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// The login page did not contain a CSRF token.
    #[error("the CSRF token was not found in the login page")]
    CsrfTokenMissing,

    /// The website answered the login submission with something other than
    /// the expected redirect.
    #[error("the website returned an unexpected status {status}")]
    UnexpectedStatus {
        /// The HTTP status code received.
        status: u16,
    },

    /// The website redirected to a page that is neither the dashboard nor
    /// the onboarding page.
    #[error("the website redirected to an unexpected page: {location}")]
    UnexpectedRedirect {
        /// The `Location` header value received.
        location: String,
    },

    /// The validity probe received a status that is neither 200 nor 403.
    #[error("unable to check authentication status: HTTP error code {status}")]
    ProbeFailed {
        /// The HTTP status code received.
        status: u16,
    },
}

impl TransportError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates an unexpected-status error.
    #[must_use]
    pub fn unexpected_status(status: u16) -> Self {
        Self::UnexpectedStatus { status }
    }

    /// Creates an unexpected-redirect error.
    pub fn unexpected_redirect(location: impl Into<String>) -> Self {
        Self::UnexpectedRedirect {
            location: location.into(),
        }
    }

    /// Creates a probe-failure error.
    #[must_use]
    pub fn probe_failed(status: u16) -> Self {
        Self::ProbeFailed { status }
    }
}
