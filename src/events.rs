use crate::errors::AdvisoryError;
use crate::models::{CreditScore, Grade};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

/// Topic scoring events are published to unless configured otherwise.
pub const DEFAULT_EVENT_TOPIC: &str = "credit-scoring-events";

pub const SCORE_CALCULATED_EVENT: &str = "credit_score_calculated";

/// Event emitted once per successful score computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEvent {
    pub event_type: String,
    pub user_id: String,
    pub score: i32,
    pub grade: Grade,
    pub timestamp: DateTime<Utc>,
}

impl ScoreEvent {
    pub fn calculated(score: &CreditScore) -> Self {
        Self {
            event_type: SCORE_CALCULATED_EVENT.to_string(),
            user_id: score.user_id.clone(),
            score: score.score,
            grade: score.grade,
            timestamp: Utc::now(),
        }
    }
}

/// Fire-and-forget event sink. Delivery is at most once; the caller does not
/// wait for anything beyond the transport acknowledging the send.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), AdvisoryError>;
}

/// Publishes events through a Kafka REST proxy (v2 API, JSON embedded format).
#[derive(Clone)]
pub struct KafkaRestPublisher {
    client: reqwest::Client,
    base_url: String,
}

impl KafkaRestPublisher {
    pub fn new(base_url: impl Into<String>) -> Result<Self, AdvisoryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| {
                AdvisoryError::Publish(format!("Failed to create event client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl EventPublisher for KafkaRestPublisher {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), AdvisoryError> {
        let value: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|e| AdvisoryError::Publish(format!("Event payload is not JSON: {}", e)))?;

        // Keying by user keeps one user's events on one partition.
        let key = value.get("userId").cloned();
        let body = json!({
            "records": [{ "key": key, "value": value }]
        });

        let url = format!("{}/topics/{}", self.base_url, topic);
        tracing::debug!("Publishing event to {}", url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/vnd.kafka.json.v2+json")
            .header("Accept", "application/vnd.kafka.v2+json")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| AdvisoryError::Publish(format!("Event proxy request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AdvisoryError::Publish(format!(
                "Event proxy returned {}: {}",
                status, error_text
            )));
        }

        Ok(())
    }
}

/// Writes events to the log instead of a broker. Used when no event sink is
/// configured.
#[derive(Debug, Clone, Default)]
pub struct LogEventPublisher;

#[async_trait]
impl EventPublisher for LogEventPublisher {
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), AdvisoryError> {
        tracing::info!(
            topic = topic,
            "Scoring event: {}",
            String::from_utf8_lossy(payload)
        );
        Ok(())
    }
}

/// Wraps a publisher with a circuit breaker so a dead broker costs one
/// fast rejection per event instead of a full request timeout.
pub struct GuardedPublisher<P, B> {
    inner: P,
    breaker: B,
}

impl<P, B> GuardedPublisher<P, B> {
    pub fn new(inner: P, breaker: B) -> Self {
        Self { inner, breaker }
    }
}

#[async_trait]
impl<P, B> EventPublisher for GuardedPublisher<P, B>
where
    P: EventPublisher,
    B: failsafe::CircuitBreaker + Send + Sync,
{
    async fn publish(&self, topic: &str, payload: &[u8]) -> Result<(), AdvisoryError> {
        if !self.breaker.is_call_permitted() {
            return Err(AdvisoryError::CircuitOpen);
        }

        let outcome = self.inner.publish(topic, payload).await;

        // Feed the already-completed outcome through the breaker to record it.
        match self.breaker.call(|| outcome) {
            Ok(()) => Ok(()),
            Err(failsafe::Error::Inner(e)) => Err(e),
            Err(failsafe::Error::Rejected) => Err(AdvisoryError::CircuitOpen),
        }
    }
}
