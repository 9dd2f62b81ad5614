use credit_scoring_api::{
    api,
    cache::MokaScoreCache,
    circuit_breaker::create_publish_circuit_breaker,
    config::Config,
    db::Database,
    db_storage::PgScoreStore,
    events::{EventPublisher, GuardedPublisher, KafkaRestPublisher, LogEventPublisher},
    handlers::AppState,
    service::ScoringService,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the application.
///
/// Initializes tracing, configuration, the database pool, the score cache
/// and the event publisher, then serves the API until SIGINT or SIGTERM.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "credit_scoring_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    // Initialize database connection pool
    let db = Database::new(&config.database_url, config.database_max_connections).await?;
    tracing::info!("Database connection pool established");
    db.run_migrations().await?;
    tracing::info!("Database migrations applied");

    let cache = MokaScoreCache::new(config.score_cache_capacity);
    tracing::info!(
        "Score cache initialized ({}s TTL, {} capacity)",
        config.score_cache_ttl_secs,
        config.score_cache_capacity
    );

    let publisher: Arc<dyn EventPublisher> = match config.event_sink_url.as_deref() {
        Some(url) => match KafkaRestPublisher::new(url) {
            Ok(client) => {
                tracing::info!("✓ Event publisher initialized: {}", url);
                Arc::new(GuardedPublisher::new(
                    client,
                    create_publish_circuit_breaker(),
                ))
            }
            Err(e) => {
                tracing::error!("Failed to initialize event publisher, logging events instead: {}", e);
                Arc::new(LogEventPublisher)
            }
        },
        None => Arc::new(LogEventPublisher),
    };

    let scoring = ScoringService::new(
        Arc::new(PgScoreStore::new(db.pool.clone())),
        Arc::new(cache),
        publisher,
    )
    .with_cache_ttl(config.score_cache_ttl())
    .with_event_topic(config.event_topic.clone());

    let app_state = Arc::new(AppState {
        scoring,
        config: config.clone(),
    });

    let app = api::create_router(app_state)?;

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Connect info feeds the per-IP rate limiter when no proxy header is present.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    db.pool.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
