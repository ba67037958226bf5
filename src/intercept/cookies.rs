//! Field-wise cookie comparison and `Set-Cookie` serialization. Both only look at the fields a
//! [`Cookie`] sets explicitly.

use crate::common::data::{ActualCookie, Cookie};
use chrono::{DateTime, Utc};
use std::fmt::Display;

const COOKIE_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

fn format_error<E: Display, A: Display>(field: &str, expected: E, actual: A) -> String {
    format!("field {}: expected {}, got {}", field, expected, actual)
}

fn format_expires(expires: &Option<DateTime<Utc>>) -> String {
    expires
        .map(|e| e.format(COOKIE_DATE_FORMAT).to_string())
        .unwrap_or_else(|| "<unset>".to_string())
}

/// Compares `expected` against `actual`. Returns whether the cookie was found (names are equal)
/// and one message per mismatching field. Fields `expected` does not set are never compared.
pub fn compare_cookies(expected: &Cookie, actual: &ActualCookie) -> (bool, Vec<String>) {
    let found = expected.name == actual.name;
    let mut errors = Vec::new();

    if !found {
        return (found, errors);
    }

    if let Some(value) = &expected.value {
        if *value != actual.value {
            errors.push(format_error("Value", value, &actual.value));
        }
    }

    if let Some(domain) = &expected.domain {
        if *domain != actual.domain {
            errors.push(format_error("Domain", domain, &actual.domain));
        }
    }

    if let Some(path) = &expected.path {
        if *path != actual.path {
            errors.push(format_error("Path", path, &actual.path));
        }
    }

    if let Some(expires) = &expected.expires {
        if Some(*expires) != actual.expires {
            errors.push(format_error(
                "Expires",
                format_expires(&expected.expires),
                format_expires(&actual.expires),
            ));
        }
    }

    if let Some(max_age) = expected.max_age {
        if max_age != actual.max_age {
            errors.push(format_error("MaxAge", max_age, actual.max_age));
        }
    }

    if let Some(secure) = expected.secure {
        if secure != actual.secure {
            errors.push(format_error("Secure", secure, actual.secure));
        }
    }

    if let Some(http_only) = expected.http_only {
        if http_only != actual.http_only {
            errors.push(format_error("HttpOnly", http_only, actual.http_only));
        }
    }

    (found, errors)
}

/// Renders `cookie` as a `Set-Cookie` header value. Attributes that were not set are omitted;
/// boolean attributes are only written when set to `true`.
pub fn to_set_cookie(cookie: &Cookie) -> String {
    let mut parts = vec![format!(
        "{}={}",
        cookie.name,
        cookie.value.as_deref().unwrap_or("")
    )];

    if let Some(path) = &cookie.path {
        parts.push(format!("Path={}", path));
    }

    if let Some(domain) = &cookie.domain {
        parts.push(format!("Domain={}", domain));
    }

    if let Some(expires) = &cookie.expires {
        parts.push(format!("Expires={}", expires.format(COOKIE_DATE_FORMAT)));
    }

    if let Some(max_age) = cookie.max_age {
        parts.push(format!("Max-Age={}", max_age));
    }

    if cookie.http_only == Some(true) {
        parts.push("HttpOnly".to_string());
    }

    if cookie.secure == Some(true) {
        parts.push("Secure".to_string());
    }

    parts.join("; ")
}

/// Parses a `Set-Cookie` header value. Returns `None` if the value has no `name=value` pair.
pub fn parse_set_cookie(header: &str) -> Option<ActualCookie> {
    let mut parts = header.split(';').map(str::trim);
    let (name, value) = parts.next()?.split_once('=')?;
    if name.trim().is_empty() {
        return None;
    }

    let mut cookie = ActualCookie::new(name.trim(), value.trim());

    for attribute in parts {
        let (key, value) = match attribute.split_once('=') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => (attribute, ""),
        };

        match key.to_ascii_lowercase().as_str() {
            "path" => cookie.path = value.to_string(),
            "domain" => cookie.domain = value.to_string(),
            "expires" => {
                cookie.expires = DateTime::parse_from_rfc2822(value)
                    .ok()
                    .map(|d| d.with_timezone(&Utc))
            }
            "max-age" => cookie.max_age = value.parse().unwrap_or_default(),
            "secure" => cookie.secure = true,
            "httponly" => cookie.http_only = true,
            _ => {}
        }
    }

    Some(cookie)
}
