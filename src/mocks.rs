//! In-memory collaborators for tests and local runs without infrastructure.

use crate::cache::ScoreCache;
use crate::db_storage::{ScoreStore, StoreError};
use crate::errors::AdvisoryError;
use crate::models::CreditScore;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct StoreState {
    records: Mutex<Vec<CreditScore>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

/// Score store kept in a vector. Clones share state.
#[derive(Clone, Default)]
pub struct MockScoreStore {
    state: Arc<StoreState>,
}

impl MockScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<CreditScore>) -> Self {
        let store = Self::new();
        store.lock().extend(records);
        store
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.state.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Number of `get_latest`/`get_history` calls served.
    pub fn reads(&self) -> usize {
        self.state.reads.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.state.writes.load(Ordering::SeqCst)
    }

    pub fn records(&self) -> Vec<CreditScore> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<CreditScore>> {
        self.state
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check_read(&self) -> Result<(), StoreError> {
        self.state.reads.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn sorted_for(&self, user_id: &str) -> Vec<CreditScore> {
        let mut scores: Vec<CreditScore> = self
            .lock()
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        scores.sort_by(|a, b| b.calculated_at.cmp(&a.calculated_at));
        scores
    }
}

#[async_trait]
impl ScoreStore for MockScoreStore {
    async fn create(&self, score: &CreditScore) -> Result<(), StoreError> {
        if self.state.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        self.state.writes.fetch_add(1, Ordering::SeqCst);
        self.lock().push(score.clone());
        Ok(())
    }

    async fn get_latest(&self, user_id: &str) -> Result<CreditScore, StoreError> {
        self.check_read()?;
        self.sorted_for(user_id)
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound)
    }

    async fn get_history(&self, user_id: &str, limit: i64) -> Result<Vec<CreditScore>, StoreError> {
        self.check_read()?;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self.sorted_for(user_id).into_iter().take(limit).collect())
    }
}

/// Cache whose writes and deletes always fail and whose reads always miss.
#[derive(Clone, Default)]
pub struct FailingScoreCache;

#[async_trait]
impl ScoreCache for FailingScoreCache {
    async fn set(&self, _key: &str, _score: &CreditScore, _ttl: Duration) -> Result<(), AdvisoryError> {
        Err(AdvisoryError::Cache("cache unavailable".to_string()))
    }

    async fn get(&self, _key: &str) -> Option<CreditScore> {
        None
    }

    async fn delete(&self, _key: &str) -> Result<(), AdvisoryError> {
        Err(AdvisoryError::Cache("cache unavailable".to_string()))
    }
}

#[derive(Default)]
struct PublisherState {
    published: Mutex<Vec<(String, Vec<u8>)>>,
    attempts: AtomicUsize,
    fail: AtomicBool,
}

/// Publisher that records every event it accepts. Clones share state.
#[derive(Clone, Default)]
pub struct MockEventPublisher {
    state: Arc<PublisherState>,
}

impl MockEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A publisher that rejects every event.
    pub fn failing() -> Self {
        let publisher = Self::new();
        publisher.state.fail.store(true, Ordering::SeqCst);
        publisher
    }

    pub fn attempts(&self) -> usize {
        self.state.attempts.load(Ordering::SeqCst)
    }

    /// `(topic, payload)` pairs in publish order.
    pub fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.state
            .published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl crate::events::EventPublisher for MockEventPublisher {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), AdvisoryError> {
        self.state.attempts.fetch_add(1, Ordering::SeqCst);
        if self.state.fail.load(Ordering::SeqCst) {
            return Err(AdvisoryError::Publish("broker unavailable".to_string()));
        }
        self.state
            .published
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((topic.to_string(), payload.to_vec()));
        Ok(())
    }
}
