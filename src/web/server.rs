//! Axum web server implementation for the relay service.

use std::net::SocketAddr;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerSettings;

use super::routes::api::api_routes;
use super::state::WebAppState;

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    active_replays: usize,
}

/// Health check endpoint handler.
async fn health(State(state): State<WebAppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        active_replays: state.replays().active_count(),
    })
}

fn cors_layer(settings: &ServerSettings) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if settings.cors_permissive {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = settings
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

/// Build the Axum router with all routes.
pub fn build_router(state: WebAppState) -> Router {
    let cors = cors_layer(&state.config().server);

    let core_routes = Router::new().route("/health", get(health));

    Router::new()
        .nest("/api", core_routes.merge(api_routes()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the web server.
///
/// This starts the Axum server and blocks until Ctrl-C. Running replays are
/// cancelled on shutdown.
pub async fn run_server(state: WebAppState) -> anyhow::Result<()> {
    let settings = &state.config().server;
    let addr: SocketAddr = format!("{}:{}", settings.host, settings.port).parse()?;
    let replays = state.replays().clone();
    let app = build_router(state);

    tracing::info!("Starting web server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down web server");
            replays.shutdown();
        })
        .await?;

    Ok(())
}
