use crate::errors::AppError;
use crate::handlers::AppState;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Rejects requests that do not carry `Authorization: Bearer <API_AUTH_TOKEN>`.
pub async fn require_bearer_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization format".to_string()))?;

    if !constant_time_compare(token, &state.config.api_auth_token) {
        return Err(AppError::Unauthorized("Invalid or expired token".to_string()));
    }

    Ok(next.run(request).await)
}

/// Compares two secrets without short-circuiting on the first mismatch.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.as_bytes()
        .iter()
        .zip(b.as_bytes().iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("s3cret", "s3cret"));
        assert!(!constant_time_compare("s3cret", "s3creT"));
        assert!(!constant_time_compare("s3cret", "s3cret-longer"));
        assert!(!constant_time_compare("", "x"));
    }
}
