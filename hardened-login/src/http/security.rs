//! Response hardening middleware.
//!
//! Every response leaving the router gets the fixed header policy below, and
//! every cookie it carries or that the client sent is re-emitted with
//! `HttpOnly`, `Secure` and `Path=/`.

use axum::extract::Request;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use cookie::Cookie;
use tracing::warn;

pub const SECURITY_HEADERS: [(&str, &str); 12] = [
    ("x-content-type-options", "nosniff"),
    ("x-xss-protection", "1; mode=block"),
    ("x-frame-options", "SAMEORIGIN"),
    (
        "strict-transport-security",
        "max-age=31536000; includeSubDomains",
    ),
    (
        "content-security-policy",
        "default-src 'self'; script-src 'self'; style-src 'self'; img-src 'self'; object-src 'none';",
    ),
    ("referrer-policy", "no-referrer"),
    (
        "permissions-policy",
        "geolocation=(), microphone=(), camera=()",
    ),
    ("cache-control", "no-store, no-cache, must-revalidate"),
    ("pragma", "no-cache"),
    ("expires", "0"),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-embedder-policy", "require-corp"),
];

pub async fn harden_response(jar: CookieJar, request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    apply_security_policy(&jar, response.headers_mut());
    response
}

pub fn apply_security_policy(request_cookies: &CookieJar, headers: &mut HeaderMap) {
    apply_security_headers(headers);
    harden_cookies(request_cookies, headers);
}

fn apply_security_headers(headers: &mut HeaderMap) {
    for (name, value) in SECURITY_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
}

/// Rewrites `Set-Cookie` so there is one hardened entry per cookie name.
/// Cookies set downstream take precedence over same-named request cookies.
fn harden_cookies(request_cookies: &CookieJar, headers: &mut HeaderMap) {
    let mut cookies: Vec<Cookie<'static>> = Vec::new();

    for value in headers.get_all(SET_COOKIE) {
        let parsed = value
            .to_str()
            .ok()
            .and_then(|raw| Cookie::parse(raw.to_owned()).ok());
        match parsed {
            Some(cookie) => upsert(&mut cookies, cookie),
            None => warn!("dropping unparseable set-cookie header"),
        }
    }

    for cookie in request_cookies.iter() {
        if !cookies.iter().any(|known| known.name() == cookie.name()) {
            cookies.push(Cookie::new(
                cookie.name().to_owned(),
                cookie.value().to_owned(),
            ));
        }
    }

    headers.remove(SET_COOKIE);
    for mut cookie in cookies {
        enforce_cookie_attributes(&mut cookie);
        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(_) => warn!(cookie = cookie.name(), "cookie is not a valid header value"),
        }
    }
}

fn upsert(cookies: &mut Vec<Cookie<'static>>, cookie: Cookie<'static>) {
    match cookies.iter_mut().find(|known| known.name() == cookie.name()) {
        Some(slot) => *slot = cookie,
        None => cookies.push(cookie),
    }
}

fn enforce_cookie_attributes(cookie: &mut Cookie<'static>) {
    cookie.set_http_only(true);
    cookie.set_secure(true);
    cookie.set_path("/");
}
