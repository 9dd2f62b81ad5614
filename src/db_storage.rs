use crate::errors::AppError;
use crate::models::CreditScore;
use async_trait::async_trait;
use sqlx::PgPool;
use std::fmt;

/// Failure reported by a [`ScoreStore`].
#[derive(Debug)]
pub enum StoreError {
    /// No score has ever been recorded for the user.
    NotFound,
    /// The store itself failed.
    Database(sqlx::Error),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "credit score not found"),
            StoreError::Database(e) => write!(f, "store failure: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("Credit score not found".to_string()),
            StoreError::Database(e) => AppError::DatabaseError(e),
        }
    }
}

/// Durable, append-only record of computed scores.
#[async_trait]
pub trait ScoreStore: Send + Sync {
    async fn create(&self, score: &CreditScore) -> Result<(), StoreError>;

    /// Most recent record by calculation time.
    async fn get_latest(&self, user_id: &str) -> Result<CreditScore, StoreError>;

    /// Up to `limit` records, newest first. Empty when the user has none.
    async fn get_history(&self, user_id: &str, limit: i64) -> Result<Vec<CreditScore>, StoreError>;
}

/// PostgreSQL-backed score store.
#[derive(Clone)]
pub struct PgScoreStore {
    pool: PgPool,
}

impl PgScoreStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScoreStore for PgScoreStore {
    async fn create(&self, score: &CreditScore) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO credit_scores
                (id, user_id, score, grade, factors, recommendation, calculated_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&score.id)
        .bind(&score.user_id)
        .bind(score.score)
        .bind(score.grade.label())
        .bind(&score.factors)
        .bind(&score.recommendation)
        .bind(score.calculated_at)
        .bind(score.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_latest(&self, user_id: &str) -> Result<CreditScore, StoreError> {
        sqlx::query_as::<_, CreditScore>(
            r#"
            SELECT id, user_id, score, grade, factors, recommendation, calculated_at, expires_at
            FROM credit_scores
            WHERE user_id = $1
            ORDER BY calculated_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn get_history(&self, user_id: &str, limit: i64) -> Result<Vec<CreditScore>, StoreError> {
        let scores = sqlx::query_as::<_, CreditScore>(
            r#"
            SELECT id, user_id, score, grade, factors, recommendation, calculated_at, expires_at
            FROM credit_scores
            WHERE user_id = $1
            ORDER BY calculated_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(scores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_map_to_app_errors() {
        assert!(matches!(
            AppError::from(StoreError::NotFound),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(StoreError::Database(sqlx::Error::PoolTimedOut)),
            AppError::DatabaseError(_)
        ));
    }
}
