use crate::{AppState, handlers};
use axum::Router;

/// Page Router Module
///
/// The renderer is an external collaborator. This fallback stands in for it so the
/// edge can run on its own; deployments pass their own page router to
/// `create_router_with_pages`.
pub fn page_routes() -> Router<AppState> {
    Router::new().fallback(handlers::render_page)
}
