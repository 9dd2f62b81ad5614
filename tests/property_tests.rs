/// Property-based tests using proptest
/// Invariants of the scoring rules that must hold for all inputs
use credit_scoring_api::core::scoring::{
    account_age_score, evaluate, grade_for, income_score, loan_history_score, recommendation_for,
    MAX_SCORE, MIN_SCORE,
};
use credit_scoring_api::models::{EmploymentStatus, LoanHistoryItem, ScoreRequest};
use proptest::prelude::*;
use std::collections::HashMap;

const INCOME_BANDS: [f64; 5] = [300.0, 450.0, 600.0, 750.0, 850.0];

fn employment() -> impl Strategy<Value = EmploymentStatus> {
    prop_oneof![
        Just(EmploymentStatus::Employed),
        Just(EmploymentStatus::SelfEmployed),
        Just(EmploymentStatus::Retired),
        Just(EmploymentStatus::Unemployed),
    ]
}

fn loan() -> impl Strategy<Value = LoanHistoryItem> {
    (0.0f64..1_000_000.0, prop_oneof![Just("paid"), Just("late"), Just("defaulted")]).prop_map(
        |(amount, status)| LoanHistoryItem {
            amount,
            status: status.to_string(),
            payment_date: None,
        },
    )
}

// Property: income sub-score is a monotone step function
proptest! {
    #[test]
    fn income_score_is_a_band_value(income in 0.0f64..10_000_000.0) {
        prop_assert!(INCOME_BANDS.contains(&income_score(income)));
    }

    #[test]
    fn income_score_is_monotone(a in 0.0f64..10_000_000.0, b in 0.0f64..10_000_000.0) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(income_score(low) <= income_score(high));
    }
}

// Property: account age ramps by 10 per month up to the cap
proptest! {
    #[test]
    fn account_age_ramp(months in 0u32..1_000) {
        let score = account_age_score(months);
        if months < 55 {
            prop_assert_eq!(account_age_score(months + 1) - score, 10.0);
        } else {
            prop_assert_eq!(score, 850.0);
        }
    }

    #[test]
    fn loan_history_score_in_range(loans in prop::collection::vec(loan(), 0..20)) {
        let score = loan_history_score(&loans);
        prop_assert!((300.0..=850.0).contains(&score));
    }
}

// Property: final score range and purity of grade/recommendation
proptest! {
    #[test]
    fn final_score_always_in_range(
        income in 0.0f64..10_000_000.0,
        status in employment(),
        months in 0u32..10_000,
        loans in prop::collection::vec(loan(), 0..10),
    ) {
        let req = ScoreRequest {
            user_id: "prop-user".to_string(),
            income_amount: income,
            employment_status: status,
            account_age_months: months,
            transaction_data: HashMap::new(),
            loan_history: loans,
        };

        let outcome = evaluate(&req);
        prop_assert!(outcome.score >= MIN_SCORE && outcome.score <= MAX_SCORE);
        prop_assert_eq!(outcome.grade, grade_for(outcome.score));
        prop_assert_eq!(outcome.recommendation.as_str(), recommendation_for(outcome.score));
        prop_assert_eq!(evaluate(&req), outcome);
    }

    #[test]
    fn grade_never_decreases_with_score(a in MIN_SCORE..=MAX_SCORE, b in MIN_SCORE..=MAX_SCORE) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(grade_for(low) <= grade_for(high));
    }
}
