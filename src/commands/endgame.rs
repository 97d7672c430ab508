//! Implements the `/endgame` command.

use poise::CreateReply;
use tracing::instrument;

use crate::data::GetData;
use crate::embeds;
use crate::BotError;
use crate::Context;

/// End the current Jeopardy game (moderators only).
#[instrument(skip(ctx))]
#[poise::command(
    slash_command,
    guild_only,
    required_permissions = "MANAGE_MESSAGES",
    default_member_permissions = "MANAGE_MESSAGES"
)]
pub async fn endgame(ctx: Context<'_>) -> Result<(), BotError> {
    let question = ctx.sessions().end_round(ctx.channel_key()).await?;
    tracing::info!("{} ended question {}.", ctx.author().name, question.id);

    ctx.send(CreateReply::default().embed(embeds::game_ended(&question)))
        .await?;
    Ok(())
}
