pub mod cors;
pub mod handlers;
pub mod state;

use crate::{config::Config, error::Result, metrics};
use axum::{Router, middleware, routing::get};
use state::AppState;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Build the application router with all routes and middleware
pub fn build_router(config: Config) -> Result<Router> {
    metrics::init();

    let state = AppState::new(config)?;

    let app = Router::new()
        .route("/", get(handlers::health::health_check))
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::metrics_handler))
        .route("/proxy", get(handlers::proxy::proxy))
        .route("/api/streams", get(handlers::streams::list_streams))
        .route("/api/master.m3u8", get(handlers::master::serve_master))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(cors::cors_middleware))
        .with_state(state);

    Ok(app)
}

/// Start the Axum HTTP server
pub async fn start(config: Config) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let addr = format!("0.0.0.0:{}", config.port);
    let app = build_router(config)?;

    let listener = match tokio::net::TcpListener::bind(addr.as_str()).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    info!("Server listening on http://{}", addr);

    let upkeep = metrics::spawn_upkeep(metrics::UPKEEP_INTERVAL);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    if let Some(task) = upkeep {
        task.abort();
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
