//! Implements the `/jeopardy_stats` command.

use poise::CreateReply;
use tracing::instrument;

use crate::embeds;
use crate::BotError;
use crate::Context;

/// Show Jeopardy database statistics.
#[instrument(skip(ctx))]
#[poise::command(slash_command, user_cooldown = 5)]
pub async fn jeopardy_stats(ctx: Context<'_>) -> Result<(), BotError> {
    let store = &ctx.data().store;
    let stats = store.stats().await?;
    let active_games = store.active_session_count().await?;

    ctx.send(CreateReply::default().embed(embeds::question_stats(&stats, active_games)))
        .await?;
    Ok(())
}
