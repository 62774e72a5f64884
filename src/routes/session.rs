use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Session Router Module
///
/// Endpoints that transition the caller's session. Logout is deliberately not behind
/// any authentication check: it must succeed for stale and anonymous callers too.
pub fn session_routes() -> Router<AppState> {
    Router::new()
        // POST /logout
        // Removes the indicator cookie, detaches the class-specific provider logout
        // and tells the client which login surface to show.
        .route("/logout", post(handlers::logout))
}
