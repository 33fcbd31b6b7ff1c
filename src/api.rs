//! Shared application state and the analytics JSON endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::analytics::{
    lookback_start, AnalyticsReport, DailyMood, EmotionAnalytics, EmotionDistribution,
    EmotionFrequency, EmotionTrends, EmotionalBalance, SentimentPoint, SummaryStats,
};
use crate::auth::AuthUser;
use crate::config::AppConfig;
use crate::emotion::EmotionDetectionService;
use crate::error::CoreError;
use crate::history::{self, EmotionHistoryRecord};

pub struct AppState {
    pub pool: PgPool,
    pub detector: Arc<EmotionDetectionService>,
    pub config: AppConfig,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AnalyticsQuery {
    /// Lookback window in days (defaults to the configured value, normally 30)
    pub days: Option<u32>,
}

/// A user's history inside the requested lookback window.
pub(crate) struct Window {
    records: Vec<EmotionHistoryRecord>,
    days: u32,
    now: DateTime<Utc>,
}

impl Window {
    pub(crate) async fn load(state: &AppState, user_id: &str, days: u32) -> Result<Self, CoreError> {
        let now = Utc::now();
        let records = history::fetch_since(&state.pool, user_id, lookback_start(now, days)).await?;
        Ok(Self { records, days, now })
    }

    pub(crate) fn analytics<'a>(&'a self, user_id: &str) -> Result<EmotionAnalytics<'a>, CoreError> {
        EmotionAnalytics::new(user_id, &self.records, self.days, self.now)
    }
}

async fn load_window(
    state: &AppState,
    user: &AuthUser,
    query: &AnalyticsQuery,
) -> Result<Window, StatusCode> {
    let days = query.days.unwrap_or(state.config.default_lookback_days);
    Ok(Window::load(state, &user.id, days).await?)
}

#[utoipa::path(
    get,
    path = "/api/analytics/emotion-distribution",
    params(AnalyticsQuery),
    responses((status = 200, description = "Percentage share per emotion")),
    tag = "analytics"
)]
pub async fn emotion_distribution(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<EmotionDistribution>, StatusCode> {
    let window = load_window(&state, &user, &query).await?;
    Ok(Json(window.analytics(&user.id)?.emotion_distribution()))
}

#[utoipa::path(
    get,
    path = "/api/analytics/daily-mood",
    params(AnalyticsQuery),
    responses((status = 200, description = "Average intensity per day", body = [DailyMood])),
    tag = "analytics"
)]
pub async fn daily_mood(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<Vec<DailyMood>>, StatusCode> {
    let window = load_window(&state, &user, &query).await?;
    Ok(Json(window.analytics(&user.id)?.daily_mood()))
}

#[utoipa::path(
    get,
    path = "/api/analytics/emotion-trends",
    params(AnalyticsQuery),
    responses((status = 200, description = "Daily occurrence series per emotion")),
    tag = "analytics"
)]
pub async fn emotion_trends(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<EmotionTrends>, StatusCode> {
    let window = load_window(&state, &user, &query).await?;
    Ok(Json(window.analytics(&user.id)?.emotion_trends()))
}

#[utoipa::path(
    get,
    path = "/api/analytics/emotion-frequency",
    params(AnalyticsQuery),
    responses((status = 200, description = "Occurrence count per emotion")),
    tag = "analytics"
)]
pub async fn emotion_frequency(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<EmotionFrequency>, StatusCode> {
    let window = load_window(&state, &user, &query).await?;
    Ok(Json(window.analytics(&user.id)?.emotion_frequency()))
}

#[utoipa::path(
    get,
    path = "/api/analytics/emotional-balance",
    params(AnalyticsQuery),
    responses((status = 200, description = "Average intensity per Positive/Negative/Neutral category")),
    tag = "analytics"
)]
pub async fn emotional_balance(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<EmotionalBalance>, StatusCode> {
    let window = load_window(&state, &user, &query).await?;
    Ok(Json(window.analytics(&user.id)?.emotional_balance()))
}

#[utoipa::path(
    get,
    path = "/api/analytics/sentiment-trends",
    params(AnalyticsQuery),
    responses((status = 200, description = "Average sentiment per day", body = [SentimentPoint])),
    tag = "analytics"
)]
pub async fn sentiment_trends(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<Vec<SentimentPoint>>, StatusCode> {
    let window = load_window(&state, &user, &query).await?;
    Ok(Json(window.analytics(&user.id)?.sentiment_trends()))
}

#[utoipa::path(
    get,
    path = "/api/analytics/summary",
    params(AnalyticsQuery),
    responses((status = 200, description = "Summary statistics", body = SummaryStats)),
    tag = "analytics"
)]
pub async fn summary(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<SummaryStats>, StatusCode> {
    let window = load_window(&state, &user, &query).await?;
    Ok(Json(window.analytics(&user.id)?.summary_stats()))
}

#[utoipa::path(
    get,
    path = "/api/analytics/report",
    params(AnalyticsQuery),
    responses((status = 200, description = "All analytics views", body = AnalyticsReport)),
    tag = "analytics"
)]
pub async fn report(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsReport>, StatusCode> {
    let window = load_window(&state, &user, &query).await?;
    Ok(Json(window.analytics(&user.id)?.report()))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub classifier: String,
    pub trained_model_loaded: bool,
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service status", body = HealthResponse)),
    tag = "system"
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        classifier: state.detector.active_classifier().to_string(),
        trained_model_loaded: state.detector.has_trained_classifier(),
    })
}
