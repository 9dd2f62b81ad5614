//! HTTP surface: routes, middleware stack, and API documentation.

use crate::auth;
use crate::errors::AppError;
use crate::handlers::{self, AppState};
use crate::openapi::ApiDoc;
use axum::{
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Largest accepted request body.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Builds the application router.
///
/// ```text
/// GET  /health                          - liveness (no auth, no rate limit)
/// GET  /docs                            - Swagger UI
/// GET  /api-docs/openapi.json           - OpenAPI document
///
/// POST /api/v1/credit/score             - compute a new score
/// GET  /api/v1/credit/score/:user_id    - current score (cache-aside)
/// GET  /api/v1/credit/history/:user_id  - up to 12 most recent scores
/// POST /api/v1/credit/refresh/:user_id  - drop cache, return latest stored
/// ```
///
/// Must be called inside a tokio runtime: it spawns the rate limiter sweep.
pub fn create_router(state: Arc<AppState>) -> anyhow::Result<Router> {
    let config = &state.config;

    // Per client IP; SmartIpKeyExtractor honours X-Forwarded-For behind a proxy.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(config.rate_limit_per_second)
            .burst_size(config.rate_limit_burst)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    // Forget clients whose quota has fully replenished so the per-IP map
    // stays bounded.
    let limiter = governor_conf.limiter().clone();
    let sweep_every = Duration::from_secs(config.rate_limit_sweep_secs.max(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            tracing::debug!("Rate limiter storage size: {}", limiter.len());
            limiter.retain_recent();
        }
    });

    let api_routes = Router::new()
        .route("/api/v1/credit/score", post(handlers::calculate_score))
        .route("/api/v1/credit/score/:user_id", get(handlers::get_score))
        .route("/api/v1/credit/history/:user_id", get(handlers::get_history))
        .route("/api/v1/credit/refresh/:user_id", post(handlers::refresh_score))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer_token,
        ))
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    let request_timeout = config.request_timeout();

    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_routes)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CatchPanicLayer::custom(|_: Box<dyn std::any::Any + Send + 'static>| {
                    AppError::InternalError("handler panicked".to_string()).into_response()
                }))
                // Dropping the handler future on timeout abandons in-flight
                // store, cache and publish calls.
                .layer(TimeoutLayer::new(request_timeout))
                .layer(CorsLayer::permissive()),
        );

    Ok(app)
}
