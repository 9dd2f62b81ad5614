use crate::handlers;
use crate::models::{
    CalculateScoreRequest, CreditScore, CreditScoreHistory, CreditScoreHistoryResponse,
    CreditScoreResponse, EmploymentStatus, Grade, LoanHistoryItem,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// OpenAPI document for the scoring endpoints, served at
/// `/api-docs/openapi.json` and rendered by Swagger UI at `/docs`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Credit Scoring API",
        description = "Computes, stores and serves consumer credit scores."
    ),
    paths(
        handlers::calculate_score,
        handlers::get_score,
        handlers::get_history,
        handlers::refresh_score
    ),
    components(schemas(
        CalculateScoreRequest,
        LoanHistoryItem,
        EmploymentStatus,
        CreditScore,
        CreditScoreHistory,
        Grade,
        CreditScoreResponse,
        CreditScoreHistoryResponse
    )),
    modifiers(&BearerAuth),
    tags((name = "credit", description = "Credit scoring"))
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_scoring_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for expected in [
            "/api/v1/credit/score",
            "/api/v1/credit/score/{user_id}",
            "/api/v1/credit/history/{user_id}",
            "/api/v1/credit/refresh/{user_id}",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing path {}",
                expected
            );
        }
        assert!(doc
            .components
            .as_ref()
            .map(|c| c.security_schemes.contains_key("bearer_auth"))
            .unwrap_or(false));
    }
}
