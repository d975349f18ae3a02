//! Cookie acceptance policy for requests that cross related sub-domains.
//!
//! The login flow sets a session cookie on the bare parent domain while the
//! browser-equivalent request is addressed to the canonical `www` host; the
//! default same-origin policy would drop that cookie. This policy carves out
//! exactly that one exception and defers to same-origin everywhere else.

/// Decides whether a cookie set during an exchange with one host may be
/// retained for replay against related hosts.
#[derive(Debug, Clone)]
pub struct CookieDomainPolicy {
    canonical_host: String,
    parent_domain: String,
}

impl Default for CookieDomainPolicy {
    fn default() -> Self {
        Self::new("www.strava.com", "strava.com")
    }
}

impl CookieDomainPolicy {
    /// Creates a policy for the given canonical `www` host and its bare
    /// parent domain.
    pub fn new(canonical_host: impl Into<String>, parent_domain: impl Into<String>) -> Self {
        Self {
            canonical_host: canonical_host.into(),
            parent_domain: parent_domain.into(),
        }
    }

    /// Returns true if a cookie scoped to `cookie_domain` set while talking
    /// to `request_host` should be retained.
    ///
    /// Accepts unconditionally when the request host is the canonical `www`
    /// host and the cookie domain is the bare parent domain. Every other
    /// combination falls back to strict same-origin matching (one leading
    /// dot on the cookie domain is ignored, comparison is case-insensitive).
    #[must_use]
    pub fn should_accept(&self, request_host: &str, cookie_domain: &str) -> bool {
        let domain = cookie_domain.strip_prefix('.').unwrap_or(cookie_domain);
        if request_host.eq_ignore_ascii_case(&self.canonical_host)
            && domain.eq_ignore_ascii_case(&self.parent_domain)
        {
            return true;
        }
        domain.eq_ignore_ascii_case(request_host)
    }
}
