use crate::models::CreditScore;
use sha2::{Digest, Sha256};

/// Cached score serialized alongside a SHA-256 checksum.
///
/// Cache reads that fail to deserialize or whose checksum does not match are
/// treated as misses, which sends the read path back to the durable store.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SealedScore {
    /// The score as JSON.
    pub data: String,
    /// SHA-256 of `data`, hex encoded.
    pub checksum: String,
}

impl SealedScore {
    pub fn seal(score: &CreditScore) -> Result<Self, serde_json::Error> {
        let data = serde_json::to_string(score)?;
        let checksum = compute_checksum(&data);
        Ok(Self { data, checksum })
    }

    pub fn is_valid(&self) -> bool {
        compute_checksum(&self.data) == self.checksum
    }

    /// Verifies the checksum and decodes the score.
    pub fn open(&self) -> Option<CreditScore> {
        if !self.is_valid() {
            tracing::warn!(
                "Cached score rejected: checksum mismatch (expected {}, {} bytes)",
                self.checksum,
                self.data.len()
            );
            return None;
        }

        match serde_json::from_str(&self.data) {
            Ok(score) => Some(score),
            Err(e) => {
                tracing::warn!("Cached score rejected: {}", e);
                None
            }
        }
    }
}

fn compute_checksum(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Grade;
    use chrono::{Duration, TimeZone, Utc};

    fn score() -> CreditScore {
        let calculated_at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        CreditScore {
            id: "cs_1709294400000000000_ab12cd34".to_string(),
            user_id: "user-1".to_string(),
            score: 688,
            grade: Grade::Good,
            factors: vec![],
            recommendation: "Good credit profile. Eligible for competitive rates.".to_string(),
            calculated_at,
            expires_at: calculated_at + Duration::days(30),
        }
    }

    #[test]
    fn test_sealed_score_opens() {
        let sealed = SealedScore::seal(&score()).unwrap();
        assert!(sealed.is_valid());
        assert_eq!(sealed.open(), Some(score()));
    }

    #[test]
    fn test_tampered_score_rejected() {
        let mut sealed = SealedScore::seal(&score()).unwrap();
        sealed.data = sealed.data.replace("688", "850");

        assert!(!sealed.is_valid());
        assert_eq!(sealed.open(), None);
    }

    #[test]
    fn test_checksum_is_stable() {
        let a = SealedScore::seal(&score()).unwrap();
        let b = SealedScore::seal(&score()).unwrap();
        assert_eq!(a.checksum, b.checksum);
    }
}
