//! Journal entries. Content is analysed on write; the reading is kept on the
//! entry and appended to the emotion history.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::history::{self, EmotionHistoryRecord, SourceType};

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema, FromRow)]
pub struct JournalEntry {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub emotion: Option<String>,
    pub emotion_confidence: Option<f64>,
    pub sentiment_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateJournalRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JournalResponse {
    pub success: bool,
    pub entry: Option<JournalEntry>,
    pub message: Option<String>,
}

pub async fn init_journal_table(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS journal_entries (
            id VARCHAR PRIMARY KEY,
            user_id VARCHAR NOT NULL,
            title VARCHAR(200) NOT NULL,
            content TEXT NOT NULL,
            emotion VARCHAR(50),
            emotion_confidence DOUBLE PRECISION,
            sentiment_score DOUBLE PRECISION,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );"#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Matches the `title VARCHAR(200)` column.
const MAX_TITLE_CHARS: usize = 200;

impl CreateJournalRequest {
    /// Trimmed title and content, or `None` if either is blank or the title
    /// does not fit the column.
    fn validated(&self) -> Option<(String, String)> {
        let title = self.title.trim();
        let content = self.content.trim();
        if title.is_empty() || content.is_empty() || title.chars().count() > MAX_TITLE_CHARS {
            return None;
        }
        Some((title.to_string(), content.to_string()))
    }
}

#[utoipa::path(
    post,
    path = "/journal",
    request_body = CreateJournalRequest,
    responses(
        (status = 200, description = "Entry analysed and saved", body = JournalResponse),
        (status = 400, description = "Title or content missing, or title longer than 200 characters")
    ),
    tag = "journal"
)]
pub async fn create_entry(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateJournalRequest>,
) -> Result<Json<JournalResponse>, StatusCode> {
    let (title, content) = req.validated().ok_or(StatusCode::BAD_REQUEST)?;

    let reading = state.detector.detect(&content);
    let entry = JournalEntry {
        id: Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        title,
        content,
        emotion: Some(reading.emotion.to_string()),
        emotion_confidence: Some(reading.confidence),
        sentiment_score: Some(reading.sentiment),
        created_at: Utc::now(),
    };
    let record = EmotionHistoryRecord::from_reading(
        &user.id,
        SourceType::Journal,
        &entry.id,
        &reading,
        entry.created_at,
    );

    let mut tx = state.pool.begin().await.map_err(|e| {
        tracing::error!("🔥 DB Error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    sqlx::query(
        r#"INSERT INTO journal_entries
           (id, user_id, title, content, emotion, emotion_confidence, sentiment_score, created_at)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
    )
    .bind(&entry.id)
    .bind(&entry.user_id)
    .bind(&entry.title)
    .bind(&entry.content)
    .bind(&entry.emotion)
    .bind(entry.emotion_confidence)
    .bind(entry.sentiment_score)
    .bind(entry.created_at)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("🔥 Error saving journal entry: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    history::insert_record(&mut tx, &record).await?;

    tx.commit().await.map_err(|e| {
        tracing::error!("🔥 DB Error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    tracing::info!("📓 [Journal] {} saved entry {} ({})", user.id, entry.id, reading.emotion);

    Ok(Json(JournalResponse {
        success: true,
        entry: Some(entry),
        message: Some("Journal entry saved".to_string()),
    }))
}

#[utoipa::path(
    get,
    path = "/journal",
    responses((status = 200, description = "Entries, newest first", body = [JournalEntry])),
    tag = "journal"
)]
pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<JournalEntry>>, StatusCode> {
    let entries = recent_entries(&state.pool, &user.id, None).await.map_err(|e| {
        tracing::error!("🔥 DB Error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(entries))
}

#[utoipa::path(
    get,
    path = "/journal/{id}",
    params(("id" = String, Path, description = "Journal entry id")),
    responses(
        (status = 200, description = "The entry", body = JournalResponse),
        (status = 404, description = "No such entry for this user")
    ),
    tag = "journal"
)]
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<JournalResponse>, StatusCode> {
    let row: Option<JournalEntry> = sqlx::query_as(
        r#"SELECT id, user_id, title, content, emotion, emotion_confidence,
           sentiment_score, created_at
           FROM journal_entries WHERE id = $1 AND user_id = $2"#,
    )
    .bind(&id)
    .bind(&user.id)
    .fetch_optional(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("🔥 DB Error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    match row {
        Some(entry) => Ok(Json(JournalResponse {
            success: true,
            entry: Some(entry),
            message: None,
        })),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// A user's entries, newest first, optionally limited.
pub async fn recent_entries(
    pool: &PgPool,
    user_id: &str,
    limit: Option<i64>,
) -> Result<Vec<JournalEntry>, sqlx::Error> {
    sqlx::query_as(
        r#"SELECT id, user_id, title, content, emotion, emotion_confidence,
           sentiment_score, created_at
           FROM journal_entries WHERE user_id = $1
           ORDER BY created_at DESC LIMIT $2"#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str, content: &str) -> CreateJournalRequest {
        CreateJournalRequest {
            title: title.into(),
            content: content.into(),
        }
    }

    #[test]
    fn test_requires_title_and_content() {
        assert!(request("", "body").validated().is_none());
        assert!(request("Title", "   ").validated().is_none());
    }

    #[test]
    fn test_title_length_limit() {
        let longest = "é".repeat(MAX_TITLE_CHARS);
        assert!(request(&longest, "body").validated().is_some());

        let too_long = "a".repeat(MAX_TITLE_CHARS + 1);
        assert!(request(&too_long, "body").validated().is_none());

        // Surrounding whitespace does not count against the limit.
        let padded = format!("  {}  ", "a".repeat(MAX_TITLE_CHARS));
        assert!(request(&padded, "body").validated().is_some());
    }

    #[test]
    fn test_trims_fields() {
        let (title, content) = request("  Monday ", " felt fine\n").validated().unwrap();
        assert_eq!(title, "Monday");
        assert_eq!(content, "felt fine");
    }
}
