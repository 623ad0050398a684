//! Session token extraction from request headers.
//!
//! A token may arrive as `Authorization: Bearer <token>` or in the session
//! cookie. Anything ambiguous resolves to no token at all.

use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use cookie::Cookie;

#[derive(Debug, PartialEq, Eq)]
enum Lookup {
    Absent,
    Found(String),
    Ambiguous,
}

/// Extract the session token from headers.
///
/// Returns `None` when no token is present, when the Authorization header is
/// repeated or malformed, when the cookie is repeated with different values,
/// or when header and cookie disagree.
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_header = bearer_from_headers(headers);
    let from_cookie = cookie_from_headers(headers, cookie_name);

    match (from_header, from_cookie) {
        (Lookup::Ambiguous, _) | (_, Lookup::Ambiguous) => None,
        (Lookup::Found(h), Lookup::Found(c)) => (h == c).then_some(h),
        (Lookup::Found(t), Lookup::Absent) | (Lookup::Absent, Lookup::Found(t)) => Some(t),
        (Lookup::Absent, Lookup::Absent) => None,
    }
}

fn bearer_from_headers(headers: &HeaderMap) -> Lookup {
    let mut values = headers.get_all(AUTHORIZATION).iter();
    match (values.next(), values.next()) {
        (None, _) => Lookup::Absent,
        (Some(value), None) => parse_bearer(value).map_or(Lookup::Ambiguous, Lookup::Found),
        (Some(_), Some(_)) => Lookup::Ambiguous,
    }
}

fn parse_bearer(value: &HeaderValue) -> Option<String> {
    let raw = value.to_str().ok()?.trim();
    let (scheme, token) = raw.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty() && !token.contains(char::is_whitespace)).then(|| token.to_string())
}

fn cookie_from_headers(headers: &HeaderMap, cookie_name: &str) -> Lookup {
    let mut found: Option<String> = None;

    for value in headers.get_all(COOKIE) {
        let Ok(raw) = value.to_str() else {
            return Lookup::Ambiguous;
        };
        // Unparseable pairs belong to other cookies and are skipped.
        for cookie in Cookie::split_parse(raw).filter_map(Result::ok) {
            if cookie.name() != cookie_name {
                continue;
            }
            let val = cookie.value_trimmed();
            if val.is_empty() {
                return Lookup::Ambiguous;
            }
            match &found {
                Some(existing) if existing != val => return Lookup::Ambiguous,
                _ => found = Some(val.to_string()),
            }
        }
    }

    found.map_or(Lookup::Absent, Lookup::Found)
}
