//! Emotion history: one immutable record per analysed chat message or journal entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use utoipa::ToSchema;

use crate::emotion::{EmotionLabel, EmotionReading};
use crate::error::{CoreError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Chat,
    Journal,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Chat => "chat",
            SourceType::Journal => "journal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EmotionHistoryRecord {
    pub user_id: String,
    pub source_type: SourceType,
    pub source_id: String,
    pub emotion: EmotionLabel,
    pub confidence: f64,
    pub sentiment: Option<f64>,
    pub intensity: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl EmotionHistoryRecord {
    pub fn from_reading(
        user_id: &str,
        source_type: SourceType,
        source_id: &str,
        reading: &EmotionReading,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            source_type,
            source_id: source_id.to_string(),
            emotion: reading.emotion,
            confidence: reading.confidence,
            sentiment: Some(reading.sentiment),
            intensity: Some(reading.intensity),
            timestamp,
        }
    }

    /// Check the value ranges every stored record must respect.
    pub fn validate(&self) -> Result<()> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);

        if !in_unit(self.confidence) {
            return Err(CoreError::DataIntegrity(format!(
                "confidence {} out of range for {} record {}",
                self.confidence,
                self.source_type.as_str(),
                self.source_id
            )));
        }
        if let Some(intensity) = self.intensity {
            if !in_unit(intensity) {
                return Err(CoreError::DataIntegrity(format!(
                    "intensity {} out of range for {} record {}",
                    intensity,
                    self.source_type.as_str(),
                    self.source_id
                )));
            }
        }
        if let Some(sentiment) = self.sentiment {
            if !(-1.0..=1.0).contains(&sentiment) {
                return Err(CoreError::DataIntegrity(format!(
                    "sentiment {} out of range for {} record {}",
                    sentiment,
                    self.source_type.as_str(),
                    self.source_id
                )));
            }
        }
        Ok(())
    }
}

/// Raw database row; labels are free text until checked.
#[derive(Debug, FromRow)]
struct HistoryRow {
    user_id: String,
    source_type: String,
    source_id: String,
    emotion: String,
    confidence: f64,
    sentiment_score: Option<f64>,
    intensity: Option<f64>,
    timestamp: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for EmotionHistoryRecord {
    type Error = CoreError;

    fn try_from(row: HistoryRow) -> Result<Self> {
        let emotion = row.emotion.parse().map_err(|_| {
            CoreError::DataIntegrity(format!(
                "stored emotion {:?} is not a supported label",
                row.emotion
            ))
        })?;
        let source_type = match row.source_type.as_str() {
            "chat" => SourceType::Chat,
            "journal" => SourceType::Journal,
            other => {
                return Err(CoreError::DataIntegrity(format!(
                    "stored source type {:?} is not chat or journal",
                    other
                )))
            }
        };

        let record = EmotionHistoryRecord {
            user_id: row.user_id,
            source_type,
            source_id: row.source_id,
            emotion,
            confidence: row.confidence,
            sentiment: row.sentiment_score,
            intensity: row.intensity,
            timestamp: row.timestamp,
        };
        record.validate()?;
        Ok(record)
    }
}

pub async fn init_emotion_history_table(pool: &PgPool) -> std::result::Result<(), sqlx::Error> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS emotion_history (
            id BIGSERIAL PRIMARY KEY,
            user_id VARCHAR NOT NULL,
            emotion VARCHAR(50) NOT NULL,
            confidence DOUBLE PRECISION NOT NULL,
            sentiment_score DOUBLE PRECISION,
            source_type VARCHAR(20) NOT NULL,
            source_id VARCHAR NOT NULL,
            timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );"#,
    )
    .execute(pool)
    .await?;

    // Added after the first release; older databases lack it.
    sqlx::query("ALTER TABLE emotion_history ADD COLUMN IF NOT EXISTS intensity DOUBLE PRECISION;")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_emotion_history_user_time ON emotion_history (user_id, timestamp);",
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Append a record inside the caller's ingestion transaction.
pub async fn insert_record(
    tx: &mut Transaction<'_, Postgres>,
    record: &EmotionHistoryRecord,
) -> Result<()> {
    record.validate()?;
    sqlx::query(
        r#"INSERT INTO emotion_history
           (user_id, emotion, confidence, sentiment_score, intensity, source_type, source_id, timestamp)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
    )
    .bind(&record.user_id)
    .bind(record.emotion.as_str())
    .bind(record.confidence)
    .bind(record.sentiment)
    .bind(record.intensity)
    .bind(record.source_type.as_str())
    .bind(&record.source_id)
    .bind(record.timestamp)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// A user's records at or after `cutoff`, oldest first.
pub async fn fetch_since(
    pool: &PgPool,
    user_id: &str,
    cutoff: DateTime<Utc>,
) -> Result<Vec<EmotionHistoryRecord>> {
    let rows: Vec<HistoryRow> = sqlx::query_as(
        r#"SELECT user_id, source_type, source_id, emotion, confidence,
           sentiment_score, intensity, timestamp
           FROM emotion_history
           WHERE user_id = $1 AND timestamp >= $2
           ORDER BY timestamp ASC, id ASC"#,
    )
    .bind(user_id)
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(EmotionHistoryRecord::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(emotion: &str, confidence: f64) -> HistoryRow {
        HistoryRow {
            user_id: "u1".into(),
            source_type: "chat".into(),
            source_id: "m1".into(),
            emotion: emotion.into(),
            confidence,
            sentiment_score: Some(0.2),
            intensity: Some(0.6),
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_row_conversion() {
        let record = EmotionHistoryRecord::try_from(row("joy", 0.7)).unwrap();
        assert_eq!(record.emotion, EmotionLabel::Joy);
        assert_eq!(record.source_type, SourceType::Chat);
    }

    #[test]
    fn test_unknown_label_is_integrity_error() {
        let err = EmotionHistoryRecord::try_from(row("boredom", 0.7)).unwrap_err();
        assert!(matches!(err, CoreError::DataIntegrity(_)));
    }

    #[test]
    fn test_out_of_range_confidence_is_integrity_error() {
        let err = EmotionHistoryRecord::try_from(row("fear", 1.4)).unwrap_err();
        assert!(matches!(err, CoreError::DataIntegrity(_)));
    }

    #[test]
    fn test_from_reading_copies_values() {
        let reading = EmotionReading {
            emotion: EmotionLabel::Love,
            confidence: 0.5,
            sentiment: 0.4,
            intensity: 0.6,
        };
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let record = EmotionHistoryRecord::from_reading("u1", SourceType::Journal, "j9", &reading, ts);
        assert_eq!(record.sentiment, Some(0.4));
        assert_eq!(record.intensity, Some(0.6));
        assert!(record.validate().is_ok());
    }
}
