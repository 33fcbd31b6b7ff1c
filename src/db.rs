use anyhow::Result;
use sqlx::postgres::PgPool;

use crate::{chat, history, journal};

/// Create every table the service needs. Safe to run on each start.
pub async fn init_db(pool: &PgPool) -> Result<()> {
    chat::init_conversations_table(pool).await?;
    journal::init_journal_table(pool).await?;
    history::init_emotion_history_table(pool).await?;
    Ok(())
}
