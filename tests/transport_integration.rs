//! Integration tests for the HTTP transport backends.
//!
//! Runs the same obligations against both backends: redirects are never
//! followed, POST bodies go out URL-form-encoded, explicit cookie headers
//! override the jar, and the jar applies the domain policy to received
//! cookies.

use std::time::Duration;

use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use heatmap_session::{
    CookieDomainPolicy, CookieJar, Http1Transport, Http2Transport, HttpRequest, Transport,
    TransportConfig, TransportError,
};

mod support;
use support::socket_guard::start_mock_server_or_skip;

/// Matches requests that carry no Cookie header at all.
struct NoCookieHeader;

impl Match for NoCookieHeader {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key("cookie")
    }
}

fn transports(mock_server: &MockServer) -> Vec<Box<dyn Transport>> {
    // The mock server's host is the "canonical" host for policy purposes.
    let host = mock_server
        .uri()
        .parse::<url::Url>()
        .ok()
        .and_then(|u| u.host_str().map(ToString::to_string))
        .unwrap_or_default();
    let policy = CookieDomainPolicy::new(host, "strava.com");
    let config = TransportConfig::default();
    vec![
        Box::new(
            Http2Transport::new(CookieJar::new(policy.clone()), &config)
                .expect("http2 backend builds"),
        ),
        Box::new(
            Http1Transport::new(CookieJar::new(policy), &config).expect("http1 backend builds"),
        ),
    ]
}

#[tokio::test]
async fn test_redirects_are_not_followed() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/session"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "https://www.strava.com/dashboard"),
        )
        .mount(&mock_server)
        .await;

    for transport in transports(&mock_server) {
        let response = transport
            .send(&HttpRequest::get(format!("{}/session", mock_server.uri())))
            .await
            .expect("request succeeds");

        assert_eq!(response.status, 302);
        assert_eq!(
            response.redirect_location.as_deref(),
            Some("https://www.strava.com/dashboard")
        );
    }
}

#[tokio::test]
async fn test_post_sends_form_encoded_body() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("POST"))
        .and(path("/session"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("email=a%40b.c&password=pw&plan="))
        .respond_with(ResponseTemplate::new(302))
        .expect(2)
        .mount(&mock_server)
        .await;

    for transport in transports(&mock_server) {
        let response = transport
            .send(&HttpRequest::post(
                format!("{}/session", mock_server.uri()),
                "email=a%40b.c&password=pw&plan=",
            ))
            .await
            .expect("request succeeds");
        assert_eq!(response.status, 302);
    }
}

#[tokio::test]
async fn test_explicit_cookie_header_overrides_jar() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    // Seed the jar with a cookie for this host.
    Mock::given(method("GET"))
        .and(path("/auth"))
        .respond_with(ResponseTemplate::new(200).insert_header("Set-Cookie", "jar_cookie=from_jar"))
        .mount(&mock_server)
        .await;

    // The probe must carry exactly the caller-supplied header.
    Mock::given(method("GET"))
        .and(path("/tiles-auth/probe"))
        .and(header("cookie", "CloudFront-Signature=EXPLICIT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&mock_server)
        .await;

    for transport in transports(&mock_server) {
        transport
            .send(&HttpRequest::get(format!("{}/auth", mock_server.uri())))
            .await
            .expect("seeding request succeeds");

        let response = transport
            .send(
                &HttpRequest::get(format!("{}/tiles-auth/probe", mock_server.uri()))
                    .with_cookie_header("CloudFront-Signature=EXPLICIT"),
            )
            .await
            .expect("probe succeeds");
        assert_eq!(response.status, 200);
    }
}

#[tokio::test]
async fn test_jar_cookies_replayed_on_same_host() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).insert_header("Set-Cookie", "sid=abc; Path=/"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dashboard"))
        .and(header("cookie", "sid=abc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&mock_server)
        .await;

    for transport in transports(&mock_server) {
        transport
            .send(&HttpRequest::get(format!("{}/login", mock_server.uri())))
            .await
            .expect("login page request succeeds");

        let response = transport
            .send(&HttpRequest::get(format!("{}/dashboard", mock_server.uri())))
            .await
            .expect("follow-up request succeeds");
        assert_eq!(response.status, 200);
    }
}

#[tokio::test]
async fn test_policy_drops_foreign_domain_cookie() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Set-Cookie", "track=1; Domain=ads.example.com"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dashboard"))
        .and(NoCookieHeader)
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&mock_server)
        .await;

    for transport in transports(&mock_server) {
        transport
            .send(&HttpRequest::get(format!("{}/login", mock_server.uri())))
            .await
            .expect("login page request succeeds");

        let response = transport
            .send(&HttpRequest::get(format!("{}/dashboard", mock_server.uri())))
            .await
            .expect("follow-up request succeeds");
        assert_eq!(response.status, 200, "foreign cookie must not be replayed");
    }
}

#[tokio::test]
async fn test_response_exposes_harvested_cookies_in_order() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/auth"))
        .respond_with(
            ResponseTemplate::new(200)
                .append_header("Set-Cookie", "CloudFront-Key-Pair-Id=AA; Path=/")
                .append_header("Set-Cookie", "CloudFront-Signature=BB; Path=/"),
        )
        .mount(&mock_server)
        .await;

    for transport in transports(&mock_server) {
        let response = transport
            .send(&HttpRequest::get(format!("{}/auth", mock_server.uri())))
            .await
            .expect("request succeeds");

        assert_eq!(
            response.cookies,
            vec![
                ("CloudFront-Key-Pair-Id".to_string(), "AA".to_string()),
                ("CloudFront-Signature".to_string(), "BB".to_string()),
            ]
        );
    }
}

#[tokio::test]
async fn test_clear_cookies_empties_jar() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).insert_header("Set-Cookie", "sid=abc"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/dashboard"))
        .and(NoCookieHeader)
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&mock_server)
        .await;

    for transport in transports(&mock_server) {
        transport
            .send(&HttpRequest::get(format!("{}/login", mock_server.uri())))
            .await
            .expect("login page request succeeds");
        transport.clear_cookies();

        let response = transport
            .send(&HttpRequest::get(format!("{}/dashboard", mock_server.uri())))
            .await
            .expect("follow-up request succeeds");
        assert_eq!(response.status, 200);
    }
}

#[tokio::test]
async fn test_request_timeout_maps_to_timeout_error() {
    let Some(mock_server) = start_mock_server_or_skip().await else {
        return;
    };

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let config = TransportConfig {
        timeout: Duration::from_secs(1),
    };
    let transport = Http1Transport::new(CookieJar::new(CookieDomainPolicy::default()), &config)
        .expect("backend builds");

    let result = transport
        .send(&HttpRequest::get(format!("{}/slow", mock_server.uri())))
        .await;

    assert!(
        matches!(result, Err(TransportError::Timeout { .. })),
        "expected timeout, got: {result:?}"
    );
}
