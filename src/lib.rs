//! Heatmap Session Library
//!
//! This library acquires and renews the short-lived session cookies that
//! authorize access to the high-resolution Strava heatmap tile servers.
//! It emulates the website login form submission, harvests the signed
//! tile cookies, caches them in a caller-supplied settings store, and
//! transparently re-authenticates when a validity probe reports the
//! cached cookies have expired.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`http`] - Pluggable HTTP transport with a domain-aware cookie jar
//! - [`auth`] - CSRF extraction, login protocol, and session management
//! - [`layer`] - Binding of session cookies onto recognized tile layers
//! - [`settings`] - Key-value settings store boundary
//!
//! The host application supplies a [`SettingsStore`] (credentials and the
//! cached cookie header live there) and a [`Notifier`] for user-facing
//! failure notices; everything else is internal.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod http;
pub mod layer;
pub mod settings;

// Re-export commonly used types
pub use auth::{
    AuthError, EMAIL_KEY, Endpoints, PASSWORD_KEY, SESSION_COOKIES_KEY, SIGNING_COOKIE_PREFIX,
    SessionError, SessionManager, extract_csrf_token,
};
pub use http::{
    CookieDomainPolicy, CookieJar, Http1Transport, Http2Transport, HttpRequest, HttpResponse,
    Method, Transport, TransportConfig, TransportError, build_transport,
};
pub use layer::{LayerBinding, Notifier, TileLayer};
pub use settings::{MemorySettings, SettingsStore};
