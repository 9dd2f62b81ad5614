use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

// ============ Request Models ============

/// Employment status accepted by the scoring pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum EmploymentStatus {
    Employed,
    SelfEmployed,
    Unemployed,
    Retired,
}

impl EmploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentStatus::Employed => "employed",
            EmploymentStatus::SelfEmployed => "self-employed",
            EmploymentStatus::Unemployed => "unemployed",
            EmploymentStatus::Retired => "retired",
        }
    }
}

impl fmt::Display for EmploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmploymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "employed" => Ok(EmploymentStatus::Employed),
            "self-employed" => Ok(EmploymentStatus::SelfEmployed),
            "unemployed" => Ok(EmploymentStatus::Unemployed),
            "retired" => Ok(EmploymentStatus::Retired),
            other => Err(format!("invalid employment status: {}", other)),
        }
    }
}

/// A single past loan submitted with a scoring request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoanHistoryItem {
    /// Loan principal.
    pub amount: f64,
    /// Repayment status. Only `"paid"` counts as paid on time.
    pub status: String,
    /// Date of the last payment, if known.
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
}

/// Raw body of `POST /api/v1/credit/score`.
///
/// The employment status is kept as a string here so that an unknown value
/// surfaces as a validation error instead of a JSON decoding failure.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculateScoreRequest {
    pub user_id: String,
    pub income_amount: f64,
    pub employment_status: String,
    /// Account age in months.
    pub account_age: i64,
    /// Free-form metadata, passed through without interpretation.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub transaction_data: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub loan_history: Vec<LoanHistoryItem>,
}

/// A scoring request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRequest {
    pub user_id: String,
    pub income_amount: f64,
    pub employment_status: EmploymentStatus,
    pub account_age_months: u32,
    pub transaction_data: HashMap<String, serde_json::Value>,
    pub loan_history: Vec<LoanHistoryItem>,
}

// ============ Score Models ============

/// Five-tier qualitative label derived from a final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub enum Grade {
    Poor,
    Fair,
    Good,
    #[serde(rename = "Very Good")]
    VeryGood,
    Excellent,
}

impl Grade {
    pub fn label(&self) -> &'static str {
        match self {
            Grade::Poor => "Poor",
            Grade::Fair => "Fair",
            Grade::Good => "Good",
            Grade::VeryGood => "Very Good",
            Grade::Excellent => "Excellent",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Poor" => Ok(Grade::Poor),
            "Fair" => Ok(Grade::Fair),
            "Good" => Ok(Grade::Good),
            "Very Good" => Ok(Grade::VeryGood),
            "Excellent" => Ok(Grade::Excellent),
            other => Err(format!("unknown grade: {}", other)),
        }
    }
}

/// A computed credit score. Immutable once created; newer records for the
/// same user supersede older ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreditScore {
    /// Unique identifier, `cs_<nanos>_<suffix>`.
    pub id: String,
    pub user_id: String,
    /// Final score in `[300, 850]`.
    pub score: i32,
    pub grade: Grade,
    /// Explanations in evaluation order.
    pub factors: Vec<String>,
    pub recommendation: String,
    pub calculated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for CreditScore {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let grade: String = row.try_get("grade")?;
        let grade = grade
            .parse::<Grade>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "grade".to_string(),
                source: e.into(),
            })?;

        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            score: row.try_get("score")?,
            grade,
            factors: row.try_get("factors")?,
            recommendation: row.try_get("recommendation")?,
            calculated_at: row.try_get("calculated_at")?,
            expires_at: row.try_get("expires_at")?,
        })
    }
}

/// Up to the twelve most recent scores for a user, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreditScoreHistory {
    pub user_id: String,
    pub history: Vec<CreditScore>,
}

// ============ Response Models ============

/// Envelope for successful API responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[aliases(CreditScoreResponse = SuccessResponse<CreditScore>, CreditScoreHistoryResponse = SuccessResponse<CreditScoreHistory>)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employment_status_round_trips_through_strings() {
        for status in [
            EmploymentStatus::Employed,
            EmploymentStatus::SelfEmployed,
            EmploymentStatus::Unemployed,
            EmploymentStatus::Retired,
        ] {
            assert_eq!(status.as_str().parse::<EmploymentStatus>(), Ok(status));
        }
        assert!("freelance".parse::<EmploymentStatus>().is_err());
        assert!("Employed".parse::<EmploymentStatus>().is_err());
    }

    #[test]
    fn grade_serializes_with_display_labels() {
        assert_eq!(
            serde_json::to_value(Grade::VeryGood).unwrap(),
            serde_json::json!("Very Good")
        );
        assert_eq!("Very Good".parse::<Grade>(), Ok(Grade::VeryGood));
        assert!(Grade::Excellent > Grade::VeryGood);
        assert!(Grade::Fair > Grade::Poor);
    }

    #[test]
    fn calculate_request_uses_camel_case_keys() {
        let body = serde_json::json!({
            "userId": "user-1",
            "incomeAmount": 120000.0,
            "employmentStatus": "employed",
            "accountAge": 24,
            "loanHistory": [
                {"amount": 1000.0, "status": "paid", "paymentDate": "2024-01-15T00:00:00Z"}
            ]
        });

        let req: CalculateScoreRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.user_id, "user-1");
        assert_eq!(req.account_age, 24);
        assert!(req.transaction_data.is_empty());
        assert_eq!(req.loan_history.len(), 1);
        assert!(req.loan_history[0].payment_date.is_some());
    }
}
