use crate::cache_validator::SealedScore;
use crate::errors::AdvisoryError;
use crate::models::CreditScore;
use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};

/// Default lifetime of a cached score.
pub const SCORE_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Cache key for a user's latest score.
pub fn score_cache_key(user_id: &str) -> String {
    format!("credit_score:{}", user_id)
}

/// Volatile key-value cache in front of the score store. Every operation is
/// advisory: callers log failures and carry on.
#[async_trait]
pub trait ScoreCache: Send + Sync {
    async fn set(&self, key: &str, score: &CreditScore, ttl: Duration) -> Result<(), AdvisoryError>;

    /// `None` on a miss, an expired entry, or an entry that fails validation.
    async fn get(&self, key: &str) -> Option<CreditScore>;

    /// Removing a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<(), AdvisoryError>;
}

#[derive(Clone)]
struct CachedScore {
    sealed: SealedScore,
    ttl: Duration,
}

/// Gives each entry the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, CachedScore> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedScore,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedScore,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process score cache backed by moka.
#[derive(Clone)]
pub struct MokaScoreCache {
    inner: Cache<String, CachedScore>,
}

impl MokaScoreCache {
    pub fn new(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { inner }
    }
}

#[async_trait]
impl ScoreCache for MokaScoreCache {
    async fn set(&self, key: &str, score: &CreditScore, ttl: Duration) -> Result<(), AdvisoryError> {
        let sealed = SealedScore::seal(score).map_err(|e| AdvisoryError::Cache(e.to_string()))?;
        self.inner
            .insert(key.to_string(), CachedScore { sealed, ttl })
            .await;
        Ok(())
    }

    async fn get(&self, key: &str) -> Option<CreditScore> {
        let entry = self.inner.get(key).await?;
        match entry.sealed.open() {
            Some(score) => Some(score),
            None => {
                self.inner.invalidate(key).await;
                None
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<(), AdvisoryError> {
        self.inner.invalidate(key).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Grade;
    use chrono::Utc;

    fn score(user_id: &str, value: i32) -> CreditScore {
        let now = Utc::now();
        CreditScore {
            id: format!("cs_test_{}", value),
            user_id: user_id.to_string(),
            score: value,
            grade: Grade::Fair,
            factors: vec!["Low income level".to_string()],
            recommendation: "Fair credit profile. May need additional documentation.".to_string(),
            calculated_at: now,
            expires_at: now + chrono::Duration::days(30),
        }
    }

    #[test]
    fn test_cache_key_format() {
        assert_eq!(score_cache_key("user-9"), "credit_score:user-9");
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = MokaScoreCache::new(100);
        let key = score_cache_key("user-1");
        let stored = score("user-1", 600);

        assert_eq!(cache.get(&key).await, None);

        cache.set(&key, &stored, SCORE_CACHE_TTL).await.unwrap();
        assert_eq!(cache.get(&key).await, Some(stored.clone()));
        // repeated reads are identical
        assert_eq!(cache.get(&key).await, cache.get(&key).await);

        cache.delete(&key).await.unwrap();
        assert_eq!(cache.get(&key).await, None);

        // deleting a missing key is fine
        cache.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_overwrite_replaces_entry() {
        let cache = MokaScoreCache::new(100);
        let key = score_cache_key("user-2");

        cache.set(&key, &score("user-2", 500), SCORE_CACHE_TTL).await.unwrap();
        cache.set(&key, &score("user-2", 720), SCORE_CACHE_TTL).await.unwrap();

        assert_eq!(cache.get(&key).await.map(|s| s.score), Some(720));
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let cache = MokaScoreCache::new(100);
        let key = score_cache_key("user-3");

        cache
            .set(&key, &score("user-3", 640), Duration::from_millis(50))
            .await
            .unwrap();
        assert!(cache.get(&key).await.is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(cache.get(&key).await, None);
    }
}
