use portal_gate::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    provider::{HttpIdentityProvider, ProviderState},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, installs logging, wires the identity provider client and
/// serves the edge.
#[tokio::main]
async fn main() {
    // 1. Configuration (fail-fast on missing production settings)
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging Filter Setup
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "portal_gate=debug,tower_http=info".into());

    // 3. Logging format per environment: pretty locally, JSON for aggregators in prod.
    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    // 4. Identity Provider Client
    let provider = HttpIdentityProvider::new(
        &config.identity_provider_url,
        config.logout_timeout(),
    )
    .expect("FATAL: Failed to build identity provider HTTP client.");
    let provider = Arc::new(provider) as ProviderState;

    tracing::info!(
        identity_provider = %config.identity_provider_url,
        cookie_secure = config.cookie_secure,
        "identity provider configured"
    );

    // 5. Router and Server Startup
    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState { provider, config });

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind listener. Check BIND_ADDR.");

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
