use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Session indicator, classification and the request-time decision.
pub mod classify;
pub mod guard;
pub mod indicator;
pub mod surfaces;

// Client-side session lifecycle and state synchronization.
pub mod lifecycle;
pub mod sync;

// Boundaries and shared types.
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod provider;

// HTTP surface segregation (Public, Session, Pages).
pub mod routes;
use routes::{pages, public, session};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use guard::{authorize, route_guard};
pub use indicator::{ClientCookies, IndicatorSource, IndicatorStore, RequestIndicator};
pub use lifecycle::SessionLifecycle;
pub use models::{AuthState, IdentityClass, RedirectDecision, RouteClassification};
pub use provider::{HttpIdentityProvider, MockIdentityProvider, ProviderState};
pub use sync::{AuthSynchronizer, StorageBus};

/// ApiDoc
///
/// OpenAPI document for the edge's own endpoints, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health, handlers::get_session, handlers::auth_callback, handlers::logout
    ),
    components(
        schemas(models::IdentityClass, models::SessionView, models::LogoutResponse)
    ),
    tags(
        (name = "portal-gate", description = "Route authorization and session edge")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, immutable state of the edge. Requests never mutate it.
#[derive(Clone)]
pub struct AppState {
    /// Remote identity provider, used only for detached logout calls.
    pub provider: ProviderState,
    /// The loaded configuration.
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for ProviderState {
    fn from_ref(app_state: &AppState) -> ProviderState {
        app_state.provider.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// The edge with the placeholder page renderer.
pub fn create_router(state: AppState) -> Router {
    create_router_with_pages(state, pages::page_routes())
}

/// create_router_with_pages
///
/// Assembles the edge around a page router. The route guard wraps everything, so no
/// page is produced before the request has been classified.
pub fn create_router_with_pages(state: AppState, pages: Router<AppState>) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(session::session_routes())
        .merge(pages)
        // Request-time authorization. Runs for every route and the page fallback.
        .layer(middleware::from_fn(guard::route_guard))
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span per request carrying method, path and the `x-request-id`.
/// The query string is left out: it can carry return-to paths and provider error codes.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        path = %request.uri().path(),
        req_id = %request_id,
    )
}
