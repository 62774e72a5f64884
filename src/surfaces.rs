//! Where each identity class lives.
//!
//! The request guard, the logout flows and the login callback all ask this module
//! for redirect targets. There is no other copy of the class -> path mapping.

use crate::models::IdentityClass;

/// The login surface for visitors whose class is not known.
pub const GENERIC_LOGIN: &str = "/login";
/// The signup surface for visitors whose class is not known.
pub const GENERIC_SIGNUP: &str = "/signup";

/// Name of the single query parameter carrying the return-to path.
pub const RETURN_TO_PARAM: &str = "redirect";

const MAX_RETURN_TO_LEN: usize = 2048;

/// home_surface
///
/// Landing page of an authenticated session of the given class.
pub fn home_surface(class: IdentityClass) -> &'static str {
    match class {
        IdentityClass::Individual => "/",
        IdentityClass::Company => "/company",
        IdentityClass::Admin => "/admin",
    }
}

/// login_surface
///
/// The dedicated login page of a class. Used after logout and after an
/// unauthorized API response, when the class of the ended session is known.
pub fn login_surface(class: IdentityClass) -> &'static str {
    match class {
        IdentityClass::Individual => GENERIC_LOGIN,
        IdentityClass::Company => "/company-login",
        IdentityClass::Admin => "/admin-login",
    }
}

/// signup_surface
///
/// Admin accounts are provisioned, not self-registered, so admins get their login page.
pub fn signup_surface(class: IdentityClass) -> &'static str {
    match class {
        IdentityClass::Individual => GENERIC_SIGNUP,
        IdentityClass::Company => "/company-signup",
        IdentityClass::Admin => "/admin-login",
    }
}

/// anonymous_login_surface
///
/// Login page shown to an anonymous visitor who asked for an area protected for `target`.
/// The admin login surface is never advertised to anonymous visitors.
pub fn anonymous_login_surface(target: IdentityClass) -> &'static str {
    match target {
        IdentityClass::Admin => GENERIC_LOGIN,
        other => login_surface(other),
    }
}

/// logout_endpoint
///
/// Path of the class-specific logout call on the remote identity provider.
pub fn logout_endpoint(class: IdentityClass) -> &'static str {
    match class {
        IdentityClass::Individual => "/logout",
        IdentityClass::Company => "/company/logout",
        IdentityClass::Admin => "/admin/logout",
    }
}

/// with_return_to
///
/// Appends `?redirect=<path>` to a fixed surface. Each path segment is percent-encoded
/// while the slashes are kept, so the parameter can never smuggle in a second
/// parameter or a fragment.
pub fn with_return_to(surface: &str, path: &str) -> String {
    format!("{surface}?{RETURN_TO_PARAM}={}", encode_path(path))
}

/// encode_path
///
/// Percent-encodes every segment of a path, keeping the `/` separators.
/// The result is plain ASCII and safe to place in a `Location` header.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// login_error
///
/// Generic login surface carrying a short diagnostic code.
pub fn login_error(reason: &str) -> String {
    format!("{GENERIC_LOGIN}?error={}", urlencoding::encode(reason))
}

/// sanitize_return_to
///
/// Accepts a caller-supplied continuation only if it is a same-origin absolute path.
/// Returns `None` for anything that a browser could resolve to another origin
/// (`//host`, `/\host`, `https://host`) or that carries control characters.
/// Accepted paths come back segment-encoded, ready for a `Location` header.
pub fn sanitize_return_to(raw: &str) -> Option<String> {
    let candidate = raw.trim();

    if candidate.is_empty() || candidate.len() > MAX_RETURN_TO_LEN {
        return None;
    }
    if !candidate.starts_with('/') {
        return None;
    }
    // Browsers treat a backslash like a slash, so `/\evil.com` is protocol-relative.
    if candidate.contains('\\') || candidate.starts_with("//") {
        return None;
    }
    if candidate.chars().any(char::is_control) {
        return None;
    }

    Some(encode_path(candidate))
}
