//! Scoring service: compute, persist, cache, publish, and serve scores.
//!
//! # Write path
//!
//! ```text
//! ScoreRequest ─► scoring::evaluate ─► ScoreStore::create ─► ScoreCache::set ─► EventPublisher::publish
//!                                         (must succeed)       (advisory)          (advisory)
//! ```
//!
//! The three side effects run sequentially. The store write is the
//! durability boundary: if it fails the whole call fails; cache and event
//! failures are logged and swallowed.
//!
//! # Read path
//!
//! Cache-aside: a cache hit is returned without touching the store; a miss
//! reads the latest record from the store and repopulates the cache.

use crate::cache::{score_cache_key, ScoreCache, SCORE_CACHE_TTL};
use crate::db_storage::ScoreStore;
use crate::errors::{AppError, ResultExt};
use crate::events::{EventPublisher, ScoreEvent, DEFAULT_EVENT_TOPIC};
use crate::models::{CreditScore, CreditScoreHistory, ScoreRequest};
use crate::scoring;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Number of records returned by [`ScoringService::get_history`].
pub const HISTORY_LIMIT: i64 = 12;

/// How long a computed score stays valid.
pub const SCORE_VALIDITY_DAYS: i64 = 30;

/// Orchestrates scoring over its collaborators. Holds no mutable state of
/// its own, so one instance is shared by every request.
#[derive(Clone)]
pub struct ScoringService {
    store: Arc<dyn ScoreStore>,
    cache: Arc<dyn ScoreCache>,
    publisher: Arc<dyn EventPublisher>,
    cache_ttl: std::time::Duration,
    event_topic: String,
}

impl ScoringService {
    pub fn new(
        store: Arc<dyn ScoreStore>,
        cache: Arc<dyn ScoreCache>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            store,
            cache,
            publisher,
            cache_ttl: SCORE_CACHE_TTL,
            event_topic: DEFAULT_EVENT_TOPIC.to_string(),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: std::time::Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_event_topic(mut self, topic: impl Into<String>) -> Self {
        self.event_topic = topic.into();
        self
    }

    /// Computes a new score for a validated request, records it, warms the
    /// cache and emits a `credit_score_calculated` event.
    pub async fn compute(&self, req: &ScoreRequest) -> Result<CreditScore, AppError> {
        tracing::info!("Calculating credit score for user {}", req.user_id);

        let outcome = scoring::evaluate(req);
        tracing::debug!(
            "Sub-scores for {}: income={} employment={} account_age={} loan_history={} -> {}",
            req.user_id,
            outcome.breakdown.income,
            outcome.breakdown.employment,
            outcome.breakdown.account_age,
            outcome.breakdown.loan_history,
            outcome.score
        );

        // Postgres keeps microseconds; truncating here keeps cached and
        // stored copies equal.
        let calculated_at = Utc::now().trunc_subsecs(6);
        let credit_score = CreditScore {
            id: generate_score_id(calculated_at),
            user_id: req.user_id.clone(),
            score: outcome.score,
            grade: outcome.grade,
            factors: outcome.factors,
            recommendation: outcome.recommendation,
            calculated_at,
            expires_at: calculated_at + Duration::days(SCORE_VALIDITY_DAYS),
        };

        if let Err(e) = self.store.create(&credit_score).await {
            tracing::error!(
                "Failed to save credit score for user {}: {}",
                req.user_id,
                e
            );
            return Err(e.into());
        }

        self.warm_cache(&credit_score).await;
        self.publish_calculated(&credit_score).await;

        tracing::info!(
            "Credit score {} computed for user {}: {} ({})",
            credit_score.id,
            credit_score.user_id,
            credit_score.score,
            credit_score.grade
        );

        Ok(credit_score)
    }

    /// Returns the user's current score, from cache when possible.
    ///
    /// A cached value may be up to one cache TTL stale.
    pub async fn get_current(&self, user_id: &str) -> Result<CreditScore, AppError> {
        let key = score_cache_key(user_id);

        if let Some(cached) = self.cache.get(&key).await {
            tracing::debug!("Score cache HIT for user {}", user_id);
            return Ok(cached);
        }

        tracing::debug!("Score cache MISS for user {}", user_id);
        let score = self.store.get_latest(user_id).await?;

        self.warm_cache(&score).await;

        Ok(score)
    }

    /// Returns up to [`HISTORY_LIMIT`] scores, newest first. A user with no
    /// scores gets an empty history.
    pub async fn get_history(&self, user_id: &str) -> Result<CreditScoreHistory, AppError> {
        let history = self
            .store
            .get_history(user_id, HISTORY_LIMIT)
            .await
            .with_context(|| format!("Failed to load score history for {}", user_id))?;

        Ok(CreditScoreHistory {
            user_id: user_id.to_string(),
            history,
        })
    }

    /// Drops the cached score and reads the store's latest record.
    ///
    /// This does not recompute: without a newer `compute` call the result is
    /// the same record that was cached before.
    pub async fn refresh(&self, user_id: &str) -> Result<CreditScore, AppError> {
        let key = score_cache_key(user_id);
        if let Err(e) = self.cache.delete(&key).await {
            tracing::warn!("Failed to invalidate cached score for {}: {}", user_id, e);
        }

        self.get_current(user_id).await
    }

    async fn warm_cache(&self, score: &CreditScore) {
        let key = score_cache_key(&score.user_id);
        if let Err(e) = self.cache.set(&key, score, self.cache_ttl).await {
            tracing::warn!("Failed to cache credit score for {}: {}", score.user_id, e);
        }
    }

    async fn publish_calculated(&self, score: &CreditScore) {
        let event = ScoreEvent::calculated(score);
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Failed to encode scoring event: {}", e);
                return;
            }
        };

        if let Err(e) = self.publisher.publish(&self.event_topic, &payload).await {
            tracing::warn!("Failed to publish event for {}: {}", score.user_id, e);
        }
    }
}

/// `cs_<unix nanos>_<random>`: sortable by creation time, unique across
/// concurrent computations within the same nanosecond.
pub fn generate_score_id(at: DateTime<Utc>) -> String {
    let nanos = at
        .timestamp_nanos_opt()
        .unwrap_or_else(|| at.timestamp_micros().saturating_mul(1_000));
    let suffix = Uuid::new_v4().simple().to_string();
    format!("cs_{}_{}", nanos, &suffix[..8])
}
