//! Path classification.
//!
//! Matching is segment-aware: `/company` covers `/company` and `/company/...`
//! but not `/company-login`. Paths are percent-decoded, stripped of empty and dot
//! segments, and compared case-insensitively before matching, so spelling
//! variants of a protected path still classify as protected.

use crate::models::{IdentityClass, RouteClassification};

/// Login and signup surfaces.
const AUTH_ONLY_PREFIXES: &[&str] = &[
    "/login",
    "/signup",
    "/company-login",
    "/company-signup",
    "/admin-login",
];

/// Areas reserved for one identity class.
const PROTECTED_PREFIXES: &[(&str, IdentityClass)] = &[
    ("/user", IdentityClass::Individual),
    ("/company", IdentityClass::Company),
    ("/admin", IdentityClass::Admin),
];

/// Landing paths of the identity provider's federated-login callback.
const AUTH_CALLBACK_PREFIXES: &[&str] = &["/auth/callback"];

/// normalize_path
///
/// Canonical form of a request path: decoded, `/`-prefixed, with empty and `.`
/// segments removed and `..` applied. Case is preserved so the result can be
/// echoed back as a return-to value.
pub fn normalize_path(raw: &str) -> String {
    // Invalid UTF-8 escapes become U+FFFD; the rest of the path still decodes.
    let bytes = urlencoding::decode_binary(raw.as_bytes());
    let decoded = String::from_utf8_lossy(&bytes);

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    format!("/{}", segments.join("/"))
}

fn under_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// classify
///
/// Maps any path to exactly one classification. Paths matching no table entry are Public.
pub fn classify(path: &str) -> RouteClassification {
    let path = normalize_path(path).to_ascii_lowercase();

    if AUTH_ONLY_PREFIXES
        .iter()
        .any(|prefix| under_prefix(&path, prefix))
    {
        return RouteClassification::AuthOnly;
    }

    PROTECTED_PREFIXES
        .iter()
        .find(|(prefix, _)| under_prefix(&path, prefix))
        .map_or(RouteClassification::Public, |(_, class)| {
            RouteClassification::Protected(*class)
        })
}

/// is_auth_flow
///
/// True while the visitor is inside a login or signup flow: AuthOnly surfaces and
/// the provider callback. The client synchronizer never asserts a session here.
pub fn is_auth_flow(path: &str) -> bool {
    if classify(path) == RouteClassification::AuthOnly {
        return true;
    }
    let path = normalize_path(path).to_ascii_lowercase();
    AUTH_CALLBACK_PREFIXES
        .iter()
        .any(|prefix| under_prefix(&path, prefix))
}
