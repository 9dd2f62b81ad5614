use crate::errors::AppError;
use crate::models::{CalculateScoreRequest, EmploymentStatus, ScoreRequest};

/// Longest user identifier accepted, in bytes. Identifiers are otherwise
/// opaque.
pub const MAX_USER_ID_BYTES: usize = 1024;

/// A user identifier is any non-blank string up to [`MAX_USER_ID_BYTES`].
pub fn is_valid_user_id(user_id: &str) -> bool {
    !user_id.trim().is_empty() && user_id.len() <= MAX_USER_ID_BYTES
}

/// Rejects a blank or oversized user identifier. The value itself is never
/// echoed back.
pub fn require_user_id(user_id: &str) -> Result<(), AppError> {
    if user_id.trim().is_empty() {
        return Err(AppError::Validation("User ID is required".to_string()));
    }
    if user_id.len() > MAX_USER_ID_BYTES {
        return Err(AppError::Validation(format!(
            "User ID must be at most {} bytes",
            MAX_USER_ID_BYTES
        )));
    }
    Ok(())
}

impl CalculateScoreRequest {
    /// Validates the raw request and converts it into a [`ScoreRequest`].
    ///
    /// Unknown employment statuses, negative or non-finite incomes, and
    /// negative account ages are rejected here so they never reach the
    /// scoring pipeline.
    pub fn validate(self) -> Result<ScoreRequest, AppError> {
        require_user_id(&self.user_id)?;

        let employment_status = self
            .employment_status
            .parse::<EmploymentStatus>()
            .map_err(AppError::Validation)?;

        if !self.income_amount.is_finite() {
            return Err(AppError::Validation(
                "income amount must be a finite number".to_string(),
            ));
        }
        if self.income_amount < 0.0 {
            return Err(AppError::Validation(
                "income amount cannot be negative".to_string(),
            ));
        }

        let account_age_months = u32::try_from(self.account_age).map_err(|_| {
            AppError::Validation(format!(
                "account age must be between 0 and {} months",
                u32::MAX
            ))
        })?;

        if let Some(pos) = self
            .loan_history
            .iter()
            .position(|loan| !loan.amount.is_finite() || loan.amount < 0.0)
        {
            return Err(AppError::Validation(format!(
                "loan history entry {} has an invalid amount",
                pos
            )));
        }

        Ok(ScoreRequest {
            user_id: self.user_id,
            income_amount: self.income_amount,
            employment_status,
            account_age_months,
            transaction_data: self.transaction_data,
            loan_history: self.loan_history,
        })
    }
}
