use crate::{
    AppState,
    config::AppConfig,
    indicator::{IndicatorSource, RequestIndicator, indicator_cookie, removal_cookie},
    lifecycle::{CallbackOutcome, logout_target, resolve_callback, spawn_remote_logout},
    models::{CallbackQuery, LogoutResponse, SessionView},
};
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, Uri, header},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

// --- Handlers ---

/// health
///
/// [Public Route] Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

/// get_session
///
/// [Public Route] The identity class the edge derives from the indicator cookie.
/// A rendering hint only: data APIs authorize with the provider's credential.
#[utoipa::path(
    get,
    path = "/session",
    responses((status = 200, description = "Derived session", body = SessionView))
)]
pub async fn get_session(jar: CookieJar) -> Json<SessionView> {
    let identity_class = RequestIndicator::from_jar(jar).read();
    Json(SessionView {
        is_authenticated: identity_class.is_some(),
        identity_class,
    })
}

/// auth_callback
///
/// [Public Route] Landing point of the identity provider's federated login.
/// On success the indicator is mirrored for same-tab consistency; on any failure
/// a leftover indicator is removed and the visitor lands on the generic login surface.
#[utoipa::path(
    get,
    path = "/auth/callback",
    params(CallbackQuery),
    responses((status = 307, description = "Redirect to the next surface"))
)]
pub async fn auth_callback(
    State(config): State<AppConfig>,
    jar: CookieJar,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let settings = config.cookie_settings();

    match resolve_callback(&query) {
        CallbackOutcome::SignedIn { class, redirect_to } => {
            tracing::info!(%class, %redirect_to, "federated login completed");
            let jar = jar.add(indicator_cookie(class, &settings));
            (jar, Redirect::temporary(&redirect_to)).into_response()
        }
        CallbackOutcome::Signup { redirect_to, .. } => {
            Redirect::temporary(&redirect_to).into_response()
        }
        CallbackOutcome::Failed { redirect_to, .. } => {
            let jar = jar.add(removal_cookie(&settings));
            (jar, Redirect::temporary(&redirect_to)).into_response()
        }
    }
}

/// logout
///
/// [Session Route] Always succeeds. The class is read before the indicator is
/// removed, because it picks the login surface and the provider endpoint. The
/// provider call is detached and cannot delay or fail this response.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 200, description = "Logged out", body = LogoutResponse))
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> impl IntoResponse {
    let class = RequestIndicator::from_jar(jar.clone()).read();

    if let Some(class) = class {
        let cookie_header = headers
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        spawn_remote_logout(state.provider.clone(), class, cookie_header);
    }

    tracing::info!(class = ?class, "logout requested");

    let jar = jar.add(removal_cookie(&state.config.cookie_settings()));
    (
        jar,
        Json(LogoutResponse {
            redirect_to: logout_target(class).to_string(),
        }),
    )
}

/// render_page
///
/// Stand-in for the page renderer. Only reached by requests the route guard allowed.
pub async fn render_page(uri: Uri) -> String {
    format!("page {}", uri.path())
}
