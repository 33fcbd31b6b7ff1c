//! Landing dashboard: headline stats plus the latest activity.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::analytics::SummaryStats;
use crate::api::{AppState, Window};
use crate::auth::AuthUser;
use crate::chat::{self, Conversation};
use crate::journal::{self, JournalEntry};

const RECENT_MESSAGES: i64 = 5;
const RECENT_JOURNALS: i64 = 3;

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub summary: SummaryStats,
    pub recent_conversations: Vec<Conversation>,
    pub recent_journals: Vec<JournalEntry>,
}

#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses((status = 200, description = "Summary and recent activity", body = DashboardResponse)),
    tag = "analytics"
)]
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<DashboardResponse>, StatusCode> {
    let window = Window::load(&state, &user.id, state.config.default_lookback_days).await?;
    let summary = window.analytics(&user.id)?.summary_stats();

    let (recent_conversations, recent_journals) = tokio::try_join!(
        chat::recent_user_messages(&state.pool, &user.id, RECENT_MESSAGES),
        journal::recent_entries(&state.pool, &user.id, Some(RECENT_JOURNALS))
    )
    .map_err(|e| {
        tracing::error!("🔥 DB Error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(DashboardResponse {
        summary,
        recent_conversations,
        recent_journals,
    }))
}
