use crate::config::Config;
use crate::errors::AppError;
use crate::models::*;
use crate::service::ScoringService;
use crate::validation::require_user_id;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Scoring pipeline and its collaborators.
    pub scoring: ScoringService,
    /// Application configuration.
    pub config: Config,
}

/// Health check endpoint. Bypasses auth and rate limiting.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "credit-scoring",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/v1/credit/score
///
/// Validates the request, computes a new score and returns it.
#[utoipa::path(
    post,
    path = "/api/v1/credit/score",
    request_body = CalculateScoreRequest,
    responses(
        (status = 200, description = "Credit score calculated", body = CreditScoreResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Score could not be recorded")
    ),
    security(("bearer_auth" = []))
)]
pub async fn calculate_score(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CalculateScoreRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse<CreditScore>>, AppError> {
    let Json(raw) = payload.map_err(|rejection| {
        tracing::warn!("Invalid request body: {}", rejection.body_text());
        AppError::Validation(rejection.body_text())
    })?;

    let request = raw.validate()?;
    tracing::info!("POST /credit/score - user: {}", request.user_id);

    let score = state.scoring.compute(&request).await?;

    Ok(Json(SuccessResponse::with_message(
        score,
        "Credit score calculated successfully",
    )))
}

/// GET /api/v1/credit/score/:user_id
#[utoipa::path(
    get,
    path = "/api/v1/credit/score/{user_id}",
    params(("user_id" = String, Path, description = "User identifier")),
    responses(
        (status = 200, description = "Current credit score", body = CreditScoreResponse),
        (status = 404, description = "User has never been scored")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_score(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<SuccessResponse<CreditScore>>, AppError> {
    require_user_id(&user_id)?;
    tracing::info!("GET /credit/score/{}", user_id);

    let score = state.scoring.get_current(&user_id).await?;

    Ok(Json(SuccessResponse::new(score)))
}

/// GET /api/v1/credit/history/:user_id
#[utoipa::path(
    get,
    path = "/api/v1/credit/history/{user_id}",
    params(("user_id" = String, Path, description = "User identifier")),
    responses(
        (status = 200, description = "Up to twelve most recent scores, newest first", body = CreditScoreHistoryResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<SuccessResponse<CreditScoreHistory>>, AppError> {
    require_user_id(&user_id)?;
    tracing::info!("GET /credit/history/{}", user_id);

    let history = state.scoring.get_history(&user_id).await?;

    Ok(Json(SuccessResponse::new(history)))
}

/// POST /api/v1/credit/refresh/:user_id
///
/// Drops the cached score and returns the latest stored one. Does not
/// recompute.
#[utoipa::path(
    post,
    path = "/api/v1/credit/refresh/{user_id}",
    params(("user_id" = String, Path, description = "User identifier")),
    responses(
        (status = 200, description = "Latest stored credit score", body = CreditScoreResponse),
        (status = 404, description = "User has never been scored")
    ),
    security(("bearer_auth" = []))
)]
pub async fn refresh_score(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<SuccessResponse<CreditScore>>, AppError> {
    require_user_id(&user_id)?;
    tracing::info!("POST /credit/refresh/{}", user_id);

    let score = state.scoring.refresh(&user_id).await?;

    Ok(Json(SuccessResponse::with_message(
        score,
        "Credit score refreshed successfully",
    )))
}
