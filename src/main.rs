use axum::{
    routing::{get, post},
    Router,
};
use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use mood_journal::{
    analytics, api, auth, chat, config::AppConfig, dashboard, db, emotion, history, journal,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        api::emotion_distribution,
        api::daily_mood,
        api::emotion_trends,
        api::emotion_frequency,
        api::emotional_balance,
        api::sentiment_trends,
        api::summary,
        api::report,
        api::health,
        auth::auth_status,
        chat::send_message,
        chat::list_messages,
        journal::create_entry,
        journal::list_entries,
        journal::get_entry,
        dashboard::dashboard
    ),
    components(
        schemas(
            analytics::AnalyticsReport,
            analytics::DailyMood,
            analytics::TrendPoint,
            analytics::SentimentPoint,
            analytics::SummaryStats,
            api::HealthResponse,
            auth::AuthUser,
            auth::AuthResponse,
            chat::Conversation,
            chat::SendMessageRequest,
            chat::SendMessageResponse,
            journal::JournalEntry,
            journal::CreateJournalRequest,
            journal::JournalResponse,
            dashboard::DashboardResponse,
            emotion::EmotionLabel,
            emotion::EmotionCategory,
            emotion::EmotionReading,
            history::SourceType
        )
    ),
    tags(
        (name = "chat", description = "Support chat"),
        (name = "journal", description = "Journal entries"),
        (name = "analytics", description = "Mood analytics"),
        (name = "auth", description = "Authentication"),
        (name = "system", description = "Service status")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;

    db::init_db(&pool).await?;

    let detector = emotion::EmotionDetectionService::from_model_dir(&config.model_dir);
    tracing::info!("🧠 Emotion detection using {} classifier", detector.active_classifier());

    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(api::AppState {
        pool,
        detector: Arc::new(detector),
        config,
    });

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::health))
        .route("/auth/status", get(auth::auth_status))
        .route("/chat/messages", post(chat::send_message).get(chat::list_messages))
        .route("/journal", post(journal::create_entry).get(journal::list_entries))
        .route("/journal/:id", get(journal::get_entry))
        .route("/api/dashboard", get(dashboard::dashboard))
        // Analytics endpoints
        .route("/api/analytics/emotion-distribution", get(api::emotion_distribution))
        .route("/api/analytics/daily-mood", get(api::daily_mood))
        .route("/api/analytics/emotion-trends", get(api::emotion_trends))
        .route("/api/analytics/emotion-frequency", get(api::emotion_frequency))
        .route("/api/analytics/emotional-balance", get(api::emotional_balance))
        .route("/api/analytics/sentiment-trends", get(api::sentiment_trends))
        .route("/api/analytics/summary", get(api::summary))
        .route("/api/analytics/report", get(api::report))
        .fallback_service(ServeDir::new("static")) // Serve frontend
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
