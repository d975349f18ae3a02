//! Error types for the authentication subsystem.

use thiserror::Error;

use crate::http::TransportError;

/// Credential problems: the user must fix the stored account details
/// before a retry can succeed. Never retried automatically.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No email address stored in the settings.
    #[error("Email address not set")]
    EmailNotSet,

    /// No password stored in the settings.
    #[error("Password not set")]
    PasswordNotSet,

    /// The website redirected the login submission back to the login
    /// form, which means it rejected the credentials.
    #[error("Authentication failed")]
    Rejected,
}

/// Failure of a session-header request: either the credentials are the
/// problem ([`AuthError`]) or the network/site is ([`TransportError`]).
#[derive(Debug, Error)]
pub enum SessionError {
    /// Credentials missing or rejected.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Network, timeout, or protocol-level failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_messages_are_user_facing() {
        assert_eq!(AuthError::EmailNotSet.to_string(), "Email address not set");
        assert_eq!(AuthError::PasswordNotSet.to_string(), "Password not set");
        assert_eq!(AuthError::Rejected.to_string(), "Authentication failed");
    }

    #[test]
    fn test_session_error_is_transparent() {
        let error = SessionError::from(AuthError::Rejected);
        assert_eq!(error.to_string(), "Authentication failed");
    }
}
