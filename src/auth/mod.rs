//! Authentication and session management.
//!
//! This module emulates the website login form submission and manages the
//! lifetime of the harvested session cookies: CSRF extraction, the login
//! protocol, the validity probe, and the cache-or-refresh decision.

mod csrf;
mod error;
mod session;

pub use csrf::extract_csrf_token;
pub use error::{AuthError, SessionError};
pub use session::{
    EMAIL_KEY, Endpoints, PASSWORD_KEY, SESSION_COOKIES_KEY, SIGNING_COOKIE_PREFIX, SessionManager,
};
