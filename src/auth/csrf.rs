//! CSRF token extraction from the login page.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

// The site emits the meta tag with exactly this attribute order and
// spacing; this is a narrow site-specific scan, not an HTML parser.
#[allow(clippy::expect_used)]
static CSRF_TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta name="csrf-token" content="(.*?)" />"#)
        .expect("CSRF token pattern is a valid literal regex")
});

/// Extracts the CSRF token from the login page HTML.
///
/// Returns the first token found, verbatim (URL-unsafe characters are the
/// caller's problem), or the empty string when the page has no
/// `csrf-token` meta tag.
#[must_use]
pub fn extract_csrf_token(html: &str) -> &str {
    match CSRF_TOKEN_PATTERN.captures(html).and_then(|c| c.get(1)) {
        Some(token) => {
            debug!(
                start = token.start(),
                end = token.end(),
                "found csrf-token meta tag"
            );
            token.as_str()
        }
        None => "",
    }
}
