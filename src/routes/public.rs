use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints reachable by any client, with or without a session.
/// None of them grant access to anything: they report or route.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(handlers::health))
        // GET /session
        // The identity class derived from the indicator cookie. Read-only.
        .route("/session", get(handlers::get_session))
        // GET /auth/callback?status=...&user_type=...&redirect=...
        // Federated login landing point. Success mirrors the indicator cookie,
        // failures clear it and land on the generic login surface.
        .route("/auth/callback", get(handlers::auth_callback))
}
