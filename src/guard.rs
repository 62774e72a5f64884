use axum::{
    extract::Request,
    http::{HeaderMap, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    classify::{classify, normalize_path},
    indicator::{IndicatorSource, RequestIndicator},
    models::{IdentityClass, RedirectDecision, RouteClassification},
    surfaces,
};

/// authorize
///
/// The request-time state machine over (path classification, indicator class).
///
/// - Public paths are always allowed.
/// - AuthOnly paths send a visitor with a session to their own home.
/// - Protected paths send anonymous visitors to a login surface with the requested
///   path as return-to, and visitors of another class to *their own* home, so a
///   mismatch reveals nothing about the area they tried to reach.
///
/// Redirect targets are built from fixed surfaces only; the request contributes
/// nothing but the encoded return-to path.
pub fn authorize(path: &str, class: Option<IdentityClass>) -> RedirectDecision {
    match (classify(path), class) {
        (RouteClassification::Public, _) => RedirectDecision::Allow,
        (RouteClassification::AuthOnly, None) => RedirectDecision::Allow,
        (RouteClassification::AuthOnly, Some(class)) => {
            RedirectDecision::RedirectTo(surfaces::home_surface(class).to_string())
        }
        (RouteClassification::Protected(target), None) => {
            RedirectDecision::RedirectTo(surfaces::with_return_to(
                surfaces::anonymous_login_surface(target),
                &normalize_path(path),
            ))
        }
        (RouteClassification::Protected(target), Some(class)) if class == target => {
            RedirectDecision::Allow
        }
        (RouteClassification::Protected(_), Some(class)) => {
            RedirectDecision::RedirectTo(surfaces::home_surface(class).to_string())
        }
    }
}

/// decide
///
/// Applies `authorize` to a request's path and indicator cookie. Reads nothing else.
pub fn decide(headers: &HeaderMap, uri: &Uri) -> RedirectDecision {
    let class = RequestIndicator::from_headers(headers).read();
    authorize(uri.path(), class)
}

/// route_guard
///
/// Middleware run before any page is produced. Pure and synchronous apart from
/// handing allowed requests on to the next service.
pub async fn route_guard(request: Request, next: Next) -> Response {
    match decide(request.headers(), request.uri()) {
        RedirectDecision::Allow => next.run(request).await,
        RedirectDecision::RedirectTo(target) => {
            tracing::debug!(path = %request.uri().path(), %target, "route guard redirect");
            Redirect::temporary(&target).into_response()
        }
    }
}
