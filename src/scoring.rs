//! Credit score computation.
//!
//! Four pure factor calculators turn single applicant attributes into
//! sub-scores in `[MIN_SCORE, MAX_SCORE]`; the aggregator combines them with
//! fixed weights and derives the grade, recommendation and factor list.

use crate::models::{EmploymentStatus, Grade, LoanHistoryItem, ScoreRequest};

pub const MIN_SCORE: i32 = 300;
pub const MAX_SCORE: i32 = 850;

/// Sub-score used when an applicant has no loan history.
pub const NEUTRAL_LOAN_HISTORY_SCORE: f64 = 500.0;

/// Factor weights. Must sum to 1.0.
pub const INCOME_WEIGHT: f64 = 0.30;
pub const EMPLOYMENT_WEIGHT: f64 = 0.25;
pub const ACCOUNT_AGE_WEIGHT: f64 = 0.20;
pub const LOAN_HISTORY_WEIGHT: f64 = 0.25;

pub const LOW_INCOME_FACTOR: &str = "Low income level";
pub const SHORT_HISTORY_FACTOR: &str = "Short account history";
pub const UNEMPLOYMENT_FACTOR: &str = "Current unemployment";
pub const STRONG_PAYMENT_FACTOR: &str = "Strong payment history";
pub const FINANCIAL_STABILITY_FACTOR: &str = "Good financial stability";

// ============ Factor Calculators ============

/// Step function over income bands.
pub fn income_score(income: f64) -> f64 {
    if income < 50_000.0 {
        300.0
    } else if income < 100_000.0 {
        450.0
    } else if income < 200_000.0 {
        600.0
    } else if income < 500_000.0 {
        750.0
    } else {
        850.0
    }
}

pub fn employment_score(status: EmploymentStatus) -> f64 {
    match status {
        EmploymentStatus::Employed => 750.0,
        EmploymentStatus::SelfEmployed => 650.0,
        EmploymentStatus::Retired => 550.0,
        EmploymentStatus::Unemployed => 350.0,
    }
}

/// Linear ramp of 10 points per month, capped at 55 months.
pub fn account_age_score(months: u32) -> f64 {
    (300.0 + f64::from(months) * 10.0).min(MAX_SCORE as f64)
}

/// Share of loans paid on time mapped onto `[300, 850]`.
pub fn loan_history_score(history: &[LoanHistoryItem]) -> f64 {
    if history.is_empty() {
        return NEUTRAL_LOAN_HISTORY_SCORE;
    }

    let paid_on_time = history.iter().filter(|loan| loan.status == "paid").count();
    let ratio = paid_on_time as f64 / history.len() as f64;
    300.0 + ratio * 550.0
}

// ============ Aggregator ============

/// Sub-scores that fed a final score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub income: f64,
    pub employment: f64,
    pub account_age: f64,
    pub loan_history: f64,
}

impl ScoreBreakdown {
    pub fn from_request(req: &ScoreRequest) -> Self {
        Self {
            income: income_score(req.income_amount),
            employment: employment_score(req.employment_status),
            account_age: account_age_score(req.account_age_months),
            loan_history: loan_history_score(&req.loan_history),
        }
    }

    pub fn weighted_sum(&self) -> f64 {
        self.income * INCOME_WEIGHT
            + self.employment * EMPLOYMENT_WEIGHT
            + self.account_age * ACCOUNT_AGE_WEIGHT
            + self.loan_history * LOAN_HISTORY_WEIGHT
    }

    /// Weighted sum truncated toward zero, then clamped into range.
    pub fn final_score(&self) -> i32 {
        (self.weighted_sum() as i32).clamp(MIN_SCORE, MAX_SCORE)
    }
}

/// Everything the aggregator derives from a request, before identity and
/// timestamps are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    pub breakdown: ScoreBreakdown,
    pub score: i32,
    pub grade: Grade,
    pub factors: Vec<String>,
    pub recommendation: String,
}

pub fn evaluate(req: &ScoreRequest) -> ScoreOutcome {
    let breakdown = ScoreBreakdown::from_request(req);
    let score = breakdown.final_score();

    ScoreOutcome {
        breakdown,
        score,
        grade: grade_for(score),
        factors: factors_for(req, score),
        recommendation: recommendation_for(score).to_string(),
    }
}

pub fn grade_for(score: i32) -> Grade {
    if score >= 800 {
        Grade::Excellent
    } else if score >= 740 {
        Grade::VeryGood
    } else if score >= 670 {
        Grade::Good
    } else if score >= 580 {
        Grade::Fair
    } else {
        Grade::Poor
    }
}

// Four tiers; the 800 boundary of the grade ladder does not exist here.
pub fn recommendation_for(score: i32) -> &'static str {
    if score >= 740 {
        "Excellent credit profile. Eligible for best rates and terms."
    } else if score >= 670 {
        "Good credit profile. Eligible for competitive rates."
    } else if score >= 580 {
        "Fair credit profile. May need additional documentation."
    } else {
        "Credit profile needs improvement. Consider secured products."
    }
}

/// Independent checks, appended in a fixed order.
pub fn factors_for(req: &ScoreRequest, score: i32) -> Vec<String> {
    let mut factors = Vec::new();

    if req.income_amount < 100_000.0 {
        factors.push(LOW_INCOME_FACTOR.to_string());
    }
    if req.account_age_months < 12 {
        factors.push(SHORT_HISTORY_FACTOR.to_string());
    }
    if req.employment_status == EmploymentStatus::Unemployed {
        factors.push(UNEMPLOYMENT_FACTOR.to_string());
    }
    if score >= 700 {
        factors.push(STRONG_PAYMENT_FACTOR.to_string());
        factors.push(FINANCIAL_STABILITY_FACTOR.to_string());
    }

    factors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn loan(status: &str) -> LoanHistoryItem {
        LoanHistoryItem {
            amount: 1000.0,
            status: status.to_string(),
            payment_date: None,
        }
    }

    fn request(
        income: f64,
        status: EmploymentStatus,
        months: u32,
        history: Vec<LoanHistoryItem>,
    ) -> ScoreRequest {
        ScoreRequest {
            user_id: "user-1".to_string(),
            income_amount: income,
            employment_status: status,
            account_age_months: months,
            transaction_data: HashMap::new(),
            loan_history: history,
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total = INCOME_WEIGHT + EMPLOYMENT_WEIGHT + ACCOUNT_AGE_WEIGHT + LOAN_HISTORY_WEIGHT;
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_income_band_edges() {
        assert_eq!(income_score(0.0), 300.0);
        assert_eq!(income_score(49_999.99), 300.0);
        assert_eq!(income_score(50_000.0), 450.0);
        assert_eq!(income_score(99_999.0), 450.0);
        assert_eq!(income_score(100_000.0), 600.0);
        assert_eq!(income_score(200_000.0), 750.0);
        assert_eq!(income_score(499_999.0), 750.0);
        assert_eq!(income_score(500_000.0), 850.0);
    }

    #[test]
    fn test_employment_lookup() {
        assert_eq!(employment_score(EmploymentStatus::Employed), 750.0);
        assert_eq!(employment_score(EmploymentStatus::SelfEmployed), 650.0);
        assert_eq!(employment_score(EmploymentStatus::Retired), 550.0);
        assert_eq!(employment_score(EmploymentStatus::Unemployed), 350.0);
    }

    #[test]
    fn test_account_age_ramp() {
        assert_eq!(account_age_score(0), 300.0);
        assert_eq!(account_age_score(55), 850.0);
        assert_eq!(account_age_score(100), 850.0);
        for months in 0..55 {
            assert_eq!(account_age_score(months + 1) - account_age_score(months), 10.0);
        }
        assert_eq!(account_age_score(u32::MAX), 850.0);
    }

    #[test]
    fn test_loan_history_extremes() {
        assert_eq!(loan_history_score(&[]), 500.0);
        assert_eq!(loan_history_score(&[loan("paid"), loan("paid")]), 850.0);
        assert_eq!(loan_history_score(&[loan("late"), loan("defaulted")]), 300.0);
        assert_eq!(loan_history_score(&[loan("paid"), loan("late")]), 575.0);
        // status match is exact
        assert_eq!(loan_history_score(&[loan("PAID")]), 300.0);
    }

    #[test]
    fn test_grade_and_recommendation_ladders_differ() {
        assert_eq!(grade_for(800), Grade::Excellent);
        assert_eq!(grade_for(799), Grade::VeryGood);
        assert_eq!(grade_for(740), Grade::VeryGood);
        assert_eq!(grade_for(739), Grade::Good);
        assert_eq!(grade_for(670), Grade::Good);
        assert_eq!(grade_for(669), Grade::Fair);
        assert_eq!(grade_for(580), Grade::Fair);
        assert_eq!(grade_for(579), Grade::Poor);

        // Excellent and Very Good share one recommendation tier.
        assert_eq!(recommendation_for(850), recommendation_for(740));
        assert_ne!(grade_for(850), grade_for(740));
        assert_ne!(recommendation_for(739), recommendation_for(740));
    }

    #[test]
    fn test_truncation_not_rounding() {
        // 90 + 87.5 + 64 + 125 = 366.5
        let req = request(10_000.0, EmploymentStatus::Unemployed, 2, vec![]);
        let outcome = evaluate(&req);
        assert_eq!(outcome.breakdown.weighted_sum(), 366.5);
        assert_eq!(outcome.score, 366);
    }

    #[test]
    fn test_high_score_adds_positive_factors_after_negative_ones() {
        // 850*0.30 + 350*0.25 + 300*0.20 + 850*0.25 = 255 + 87.5 + 60 + 212.5 = 615
        let req = request(600_000.0, EmploymentStatus::Unemployed, 0, vec![loan("paid")]);
        let outcome = evaluate(&req);
        assert_eq!(outcome.score, 615);
        assert_eq!(
            outcome.factors,
            vec![SHORT_HISTORY_FACTOR.to_string(), UNEMPLOYMENT_FACTOR.to_string()]
        );

        let req = request(
            600_000.0,
            EmploymentStatus::Employed,
            60,
            vec![loan("paid")],
        );
        let outcome = evaluate(&req);
        // 255 + 187.5 + 170 + 212.5 = 825
        assert_eq!(outcome.score, 825);
        assert_eq!(outcome.grade, Grade::Excellent);
        assert_eq!(
            outcome.factors,
            vec![
                STRONG_PAYMENT_FACTOR.to_string(),
                FINANCIAL_STABILITY_FACTOR.to_string()
            ]
        );
    }

    #[test]
    fn test_factor_list_is_deterministic() {
        let req = request(20_000.0, EmploymentStatus::Unemployed, 3, vec![loan("late")]);
        assert_eq!(evaluate(&req).factors, evaluate(&req).factors);
    }
}
