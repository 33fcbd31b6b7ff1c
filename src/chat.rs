//! Chat with the support bot.
//!
//! Each user message is analysed, stored with its reading, answered with a
//! templated reply chosen by emotion and sentiment, and appended to the
//! user's emotion history.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::emotion::{EmotionLabel, EmotionReading};
use crate::history::{self, EmotionHistoryRecord, SourceType};

const JOY_REPLIES: &[&str] = &[
    "I'm so glad to hear you're feeling positive! That's wonderful. What's bringing you this joy today?",
    "It's beautiful to see your happiness shine through! Would you like to share more about what's making you feel so good?",
    "Your positive energy is contagious! How can we help you maintain this wonderful feeling?",
];

const SADNESS_REPLIES: &[&str] = &[
    "I can sense you're going through a difficult time. I'm here to listen and support you. Would you like to talk about what's troubling you?",
    "It's okay to feel sad sometimes. Your feelings are valid, and I'm here with you. How can I best support you right now?",
    "I'm sorry you're feeling down. Remember that it's brave to reach out and share your feelings. What would help you feel a little better today?",
];

const ANGER_REPLIES: &[&str] = &[
    "I can hear the frustration in your words. It's natural to feel angry sometimes. Would you like to talk about what's bothering you?",
    "Strong emotions like anger can be overwhelming. Let's work through this together. What triggered these feelings?",
    "I understand you're feeling upset. Taking a moment to breathe can help. What's causing this anger, and how can we address it?",
];

const FEAR_REPLIES: &[&str] = &[
    "I can sense you're feeling anxious or scared. That must be really difficult. You're safe here, and we can work through this together.",
    "Fear can be overwhelming, but you're not alone. I'm here to help you process these feelings. What's making you feel afraid?",
    "It takes courage to acknowledge fear. You're being brave by sharing this with me. How can I help you feel more secure?",
];

const SURPRISE_REPLIES: &[&str] = &[
    "It sounds like something unexpected happened! How are you processing this surprise?",
    "Life can certainly throw us curveballs! How are you feeling about this unexpected turn of events?",
    "Surprises can be overwhelming. Take your time to process what happened. How can I support you through this?",
];

const LOVE_REPLIES: &[&str] = &[
    "It's wonderful to hear about the love and connection in your life! These feelings are so important for our wellbeing.",
    "Love is such a beautiful emotion. It's lovely that you're experiencing these positive feelings. Tell me more about what's bringing you this joy.",
    "The love you're expressing is heartwarming. How does it feel to experience such positive emotions?",
];

const NEUTRAL_REPLIES: &[&str] = &[
    "Thank you for sharing with me. I'm here to listen and support you in whatever way you need.",
    "I appreciate you opening up to me. How are you feeling right now, and what would be most helpful for you?",
    "I'm glad you're here and willing to share your thoughts. What's on your mind today?",
];

const SUPPORTIVE_PREFIXES: &[&str] = &[
    "I want you to know that your feelings are completely valid. ",
    "It's important that you're expressing these difficult emotions. ",
    "Remember, you don't have to go through this alone. ",
];

const ENCOURAGING_PREFIXES: &[&str] = &[
    "It's wonderful to hear such positivity from you! ",
    "Your positive outlook is inspiring. ",
    "I love hearing about the good things in your life. ",
];

/// Polarity beyond which a reply gets a supportive or encouraging opener.
const SENTIMENT_PREFIX_THRESHOLD: f64 = 0.3;

fn replies_for(emotion: EmotionLabel) -> &'static [&'static str] {
    match emotion {
        EmotionLabel::Joy => JOY_REPLIES,
        EmotionLabel::Sadness => SADNESS_REPLIES,
        EmotionLabel::Anger => ANGER_REPLIES,
        EmotionLabel::Fear => FEAR_REPLIES,
        EmotionLabel::Surprise => SURPRISE_REPLIES,
        EmotionLabel::Love => LOVE_REPLIES,
        EmotionLabel::Neutral => NEUTRAL_REPLIES,
    }
}

fn pick<R: Rng + ?Sized>(options: &[&'static str], rng: &mut R) -> &'static str {
    options.choose(rng).copied().unwrap_or_default()
}

/// Choose the bot's reply for a detected emotion and sentiment.
pub fn compose_reply<R: Rng + ?Sized>(emotion: EmotionLabel, sentiment: f64, rng: &mut R) -> String {
    let body = pick(replies_for(emotion), rng);

    let prefix = if sentiment < -SENTIMENT_PREFIX_THRESHOLD {
        pick(SUPPORTIVE_PREFIXES, rng)
    } else if sentiment > SENTIMENT_PREFIX_THRESHOLD {
        pick(ENCOURAGING_PREFIXES, rng)
    } else {
        ""
    };

    format!("{}{}", prefix, body)
}

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema, FromRow)]
pub struct Conversation {
    pub id: String,
    pub user_id: String,
    pub message: String,
    pub is_user_message: bool,
    pub emotion: Option<String>,
    pub emotion_confidence: Option<f64>,
    pub sentiment_score: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SendMessageResponse {
    pub success: bool,
    pub user_message: Conversation,
    pub reading: EmotionReading,
    pub bot_response: Conversation,
}

pub async fn init_conversations_table(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS conversations (
            id VARCHAR PRIMARY KEY,
            user_id VARCHAR NOT NULL,
            message TEXT NOT NULL,
            is_user_message BOOLEAN NOT NULL,
            emotion VARCHAR(50),
            emotion_confidence DOUBLE PRECISION,
            sentiment_score DOUBLE PRECISION,
            timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_conversations_user_time ON conversations (user_id, timestamp);",
    )
    .execute(pool)
    .await?;
    Ok(())
}

#[utoipa::path(
    post,
    path = "/chat/messages",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Message analysed and answered", body = SendMessageResponse),
        (status = 400, description = "Empty message"),
        (status = 401, description = "Missing or invalid token")
    ),
    tag = "chat"
)]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, StatusCode> {
    let message = req.message.trim().to_string();
    if message.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let reading = state.detector.detect(&message);
    let reply = compose_reply(reading.emotion, reading.sentiment, &mut rand::thread_rng());
    let now = Utc::now();

    let user_message = Conversation {
        id: Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        message,
        is_user_message: true,
        emotion: Some(reading.emotion.to_string()),
        emotion_confidence: Some(reading.confidence),
        sentiment_score: Some(reading.sentiment),
        timestamp: now,
    };
    let bot_response = Conversation {
        id: Uuid::new_v4().to_string(),
        user_id: user.id.clone(),
        message: reply,
        is_user_message: false,
        emotion: None,
        emotion_confidence: None,
        sentiment_score: None,
        timestamp: now,
    };
    let record =
        EmotionHistoryRecord::from_reading(&user.id, SourceType::Chat, &user_message.id, &reading, now);

    let mut tx = state.pool.begin().await.map_err(|e| {
        tracing::error!("🔥 DB Error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    for row in [&user_message, &bot_response] {
        sqlx::query(
            r#"INSERT INTO conversations
               (id, user_id, message, is_user_message, emotion, emotion_confidence, sentiment_score, timestamp)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
        )
        .bind(&row.id)
        .bind(&row.user_id)
        .bind(&row.message)
        .bind(row.is_user_message)
        .bind(&row.emotion)
        .bind(row.emotion_confidence)
        .bind(row.sentiment_score)
        .bind(row.timestamp)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("🔥 Error saving conversation: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    }

    history::insert_record(&mut tx, &record).await?;

    tx.commit().await.map_err(|e| {
        tracing::error!("🔥 DB Error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    tracing::info!(
        "💬 [Chat] {} -> {} ({:.2})",
        user.id,
        reading.emotion,
        reading.confidence
    );

    Ok(Json(SendMessageResponse {
        success: true,
        user_message,
        reading,
        bot_response,
    }))
}

#[utoipa::path(
    get,
    path = "/chat/messages",
    responses((status = 200, description = "Conversation history, oldest first", body = [Conversation])),
    tag = "chat"
)]
pub async fn list_messages(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<Conversation>>, StatusCode> {
    let conversations: Vec<Conversation> = sqlx::query_as(
        r#"SELECT id, user_id, message, is_user_message, emotion, emotion_confidence,
           sentiment_score, timestamp
           FROM conversations WHERE user_id = $1
           ORDER BY timestamp ASC, is_user_message DESC"#,
    )
    .bind(&user.id)
    .fetch_all(&state.pool)
    .await
    .map_err(|e| {
        tracing::error!("🔥 DB Error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(conversations))
}

/// Most recent user-authored messages, newest first.
pub async fn recent_user_messages(
    pool: &PgPool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<Conversation>, sqlx::Error> {
    sqlx::query_as(
        r#"SELECT id, user_id, message, is_user_message, emotion, emotion_confidence,
           sentiment_score, timestamp
           FROM conversations WHERE user_id = $1 AND is_user_message = TRUE
           ORDER BY timestamp DESC LIMIT $2"#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_reply_matches_emotion() {
        let mut rng = StdRng::seed_from_u64(7);
        for emotion in EmotionLabel::ALL {
            let reply = compose_reply(emotion, 0.0, &mut rng);
            assert!(replies_for(emotion).contains(&reply.as_str()), "{}: {}", emotion, reply);
        }
    }

    #[test]
    fn test_negative_sentiment_adds_support() {
        let mut rng = StdRng::seed_from_u64(1);
        let reply = compose_reply(EmotionLabel::Sadness, -0.8, &mut rng);
        assert!(SUPPORTIVE_PREFIXES.iter().any(|p| reply.starts_with(p)));
        assert!(SADNESS_REPLIES.iter().any(|r| reply.ends_with(r)));
    }

    #[test]
    fn test_positive_sentiment_adds_encouragement() {
        let mut rng = StdRng::seed_from_u64(2);
        let reply = compose_reply(EmotionLabel::Joy, 0.9, &mut rng);
        assert!(ENCOURAGING_PREFIXES.iter().any(|p| reply.starts_with(p)));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut rng = StdRng::seed_from_u64(3);
        let reply = compose_reply(EmotionLabel::Neutral, 0.3, &mut rng);
        assert!(NEUTRAL_REPLIES.contains(&reply.as_str()));
    }

    #[test]
    fn test_same_seed_same_reply() {
        let a = compose_reply(EmotionLabel::Fear, -0.5, &mut StdRng::seed_from_u64(11));
        let b = compose_reply(EmotionLabel::Fear, -0.5, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
    }
}
