//! Owned, insertion-ordered cookie jar.
//!
//! Deliberately narrow: it understands exactly what the login flow needs
//! (name, value, and the `Domain` attribute of a `Set-Cookie` header) and
//! nothing else. Acceptance is delegated to [`CookieDomainPolicy`]; this is
//! not a general cookie-jar engine.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use super::policy::CookieDomainPolicy;

/// A cookie retained by the jar.
///
/// The value is redacted in Debug output to prevent accidental logging of
/// session secrets.
#[derive(Clone)]
struct StoredCookie {
    domain: String,
    name: String,
    value: String,
}

impl fmt::Debug for StoredCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCookie")
            .field("domain", &self.domain)
            .field("name", &self.name)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

/// Cookie jar owned by a transport instance.
///
/// Cookies are kept in the order they were first stored; re-setting an
/// existing cookie updates the value in place. The jar is internally
/// synchronized so a transport can use it through `&self`.
#[derive(Debug)]
pub struct CookieJar {
    policy: CookieDomainPolicy,
    cookies: Mutex<Vec<StoredCookie>>,
}

impl CookieJar {
    /// Creates an empty jar governed by `policy`.
    #[must_use]
    pub fn new(policy: CookieDomainPolicy) -> Self {
        Self {
            policy,
            cookies: Mutex::new(Vec::new()),
        }
    }

    /// Ingests one `Set-Cookie` header received from `request_host`.
    ///
    /// A cookie without a `Domain` attribute is scoped to the request host.
    /// Cookies the policy rejects, and headers without a `name=value` part,
    /// are dropped silently (logged at debug level).
    pub fn store(&self, request_host: &str, set_cookie_header: &str) {
        let Some(parsed) = parse_set_cookie(set_cookie_header) else {
            debug!(host = request_host, "ignoring malformed Set-Cookie header");
            return;
        };

        let domain = parsed
            .domain
            .as_deref()
            .map_or(request_host, |d| d.strip_prefix('.').unwrap_or(d))
            .to_ascii_lowercase();

        let accepted = self
            .policy
            .should_accept(request_host, parsed.domain.as_deref().unwrap_or(request_host));
        debug!(
            cookie = %parsed.name,
            host = request_host,
            "cookie {}",
            if accepted { "accepted" } else { "rejected" }
        );
        if !accepted {
            return;
        }

        let mut cookies = self.lock();
        if let Some(existing) = cookies
            .iter_mut()
            .find(|c| c.domain == domain && c.name == parsed.name)
        {
            existing.value = parsed.value;
        } else {
            cookies.push(StoredCookie {
                domain,
                name: parsed.name,
                value: parsed.value,
            });
        }
    }

    /// Returns the `Cookie` header to attach to a request for `host`, or
    /// `None` when no stored cookie applies.
    ///
    /// A cookie applies when its domain equals the host or the host is a
    /// sub-domain of it. Pairs are joined with `;` in insertion order.
    #[must_use]
    pub fn cookie_header_for(&self, host: &str) -> Option<String> {
        let header = self
            .lock()
            .iter()
            .filter(|c| domain_matches(&c.domain, host))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join(";");
        if header.is_empty() { None } else { Some(header) }
    }

    /// Returns all cookies applicable to `host` as `(name, value)` pairs in
    /// insertion order.
    #[must_use]
    pub fn cookies_for(&self, host: &str) -> Vec<(String, String)> {
        self.lock()
            .iter()
            .filter(|c| domain_matches(&c.domain, host))
            .map(|c| (c.name.clone(), c.value.clone()))
            .collect()
    }

    /// Removes every cookie from the jar.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<StoredCookie>> {
        self.cookies.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct ParsedSetCookie {
    name: String,
    value: String,
    domain: Option<String>,
}

/// Parses the `name=value` pair and the `Domain` attribute from a
/// `Set-Cookie` header. Other attributes are irrelevant here and skipped.
fn parse_set_cookie(header: &str) -> Option<ParsedSetCookie> {
    let mut segments = header.split(';');

    let (name, value) = segments.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let domain = segments.find_map(|segment| {
        let (key, attr_value) = segment.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("domain")
            .then(|| attr_value.trim().to_string())
    });

    Some(ParsedSetCookie {
        name: name.to_string(),
        value: value.trim().to_string(),
        domain,
    })
}

/// Returns true when a cookie scoped to `cookie_domain` applies to requests
/// for `host`: exact match, or `host` is a sub-domain of the cookie domain.
fn domain_matches(cookie_domain: &str, host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == cookie_domain || host.ends_with(&format!(".{cookie_domain}"))
}
