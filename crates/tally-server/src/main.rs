//! Tally Server - Main entry point

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tally_common::logging::{init_logging, LogConfig};
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tracing::info;

use tally_server::{
    audit::{recorder::AuditRecorder, retention, store::PgAuditStore},
    config::Config,
    db, features, middleware,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with configuration from environment
    let log_config = LogConfig::builder()
        .log_file_prefix("tally-server".to_string())
        .filter_directives("tally_server=debug,tower_http=debug,sqlx=info".to_string())
        .build();

    // Merge with environment variables (they take precedence)
    let log_config = LogConfig::from_env().unwrap_or(log_config);

    init_logging(&log_config)?;

    info!("Starting Tally Server");

    // Load configuration
    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    // Initialize database connection pool
    let db_pool = db::create_pool(&config.database).await?;

    // Run migrations
    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;

    info!("Database migrations completed");

    // Wire the audit engine: store, append worker, retention sweeper
    let store = Arc::new(PgAuditStore::new(db_pool.clone()));
    let (recorder, _worker) =
        AuditRecorder::spawn(store.clone(), config.audit.queue_capacity);
    let _sweeper = retention::spawn_sweeper(
        store.clone(),
        config.audit.retention_days,
        Duration::from_secs(config.audit.sweep_interval_secs),
    );
    info!(
        retention_days = config.audit.retention_days,
        queue_capacity = config.audit.queue_capacity,
        "Audit engine started"
    );

    let state = features::AuditState {
        store,
        recorder,
        links: Arc::new(features::audit_trail::RouteLinkResolver),
    };

    // Build the application router
    let app = create_router(state, db_pool, &config);

    // Create socket address
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_router(state: features::AuditState, db_pool: sqlx::PgPool, config: &Config) -> Router {
    let feature_routes = features::router(state);

    Router::new()
        .route("/health", get(health_check))
        .with_state(db_pool)
        .nest("/api/v1", feature_routes)
        .fallback(fallback_404)
        // Apply layers from innermost to outermost
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

/// Fallback handler for unknown routes
async fn fallback_404(uri: axum::http::Uri) -> tally_server::AppError {
    tally_server::AppError::NotFound(format!("No route for {}", uri))
}

/// Health check handler
async fn health_check(State(pool): State<sqlx::PgPool>) -> Result<Response, StatusCode> {
    match db::health_check(&pool).await {
        Ok(()) => Ok((
            StatusCode::OK,
            Json(json!({
                "status": "healthy",
                "database": "connected"
            })),
        )
            .into_response()),
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        },
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // Give ongoing requests and the append worker time to finish
    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
