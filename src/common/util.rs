use regex::Regex;
use std::{
    collections::HashMap,
    str::FromStr,
    sync::{Arc, RwLock},
};

// ===============================================================================================
// Headers
// ===============================================================================================

/// Normalizes a header name the way `http::HeaderName` stores it (lower case).
///
/// # Panics
/// Panics if `key` is not a valid header name. Mocks are declared in test code, so an invalid
/// header name is a programming error that should surface at declaration time.
pub(crate) fn normalize_header_key(key: &str) -> String {
    http::HeaderName::from_str(key)
        .unwrap_or_else(|err| panic!("cannot parse '{}' as a header name: {}", key, err))
        .as_str()
        .to_string()
}

// ===============================================================================================
// Environment
// ===============================================================================================
pub(crate) fn read_env(name: &str, default: &str) -> String {
    match std::env::var(name) {
        Ok(value) => value,
        Err(_) => default.to_string(),
    }
}

pub(crate) fn read_env_flag(name: &str) -> bool {
    matches!(
        read_env(name, "false").trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ===============================================================================================
// Strings
// ===============================================================================================

/// Returns `true` if `expected` equals `actual` or, failing that, if `expected` compiles to a
/// regular expression that matches `actual`.
pub(crate) fn matches_exact_or_regex(expected: &str, actual: &str) -> bool {
    if expected == actual {
        return true;
    }

    cached_regex(expected)
        .map(|re| re.is_match(actual))
        .unwrap_or(false)
}

lazy_static! {
    // Keyed by pattern. Patterns come from mock declarations.
    static ref REGEX_CACHE: RwLock<HashMap<String, Option<Arc<Regex>>>> =
        RwLock::new(HashMap::new());
}

/// Compiles `pattern` once per process. Patterns that are not valid regular expressions are
/// remembered as `None`.
pub(crate) fn cached_regex(pattern: &str) -> Option<Arc<Regex>> {
    {
        let cache = REGEX_CACHE.read().unwrap_or_else(|err| err.into_inner());
        if let Some(entry) = cache.get(pattern) {
            return entry.clone();
        }
    }

    let compiled = Regex::new(pattern).ok().map(Arc::new);
    REGEX_CACHE
        .write()
        .unwrap_or_else(|err| err.into_inner())
        .insert(pattern.to_string(), compiled.clone());
    compiled
}
