//! Implements `/turnover` and `/turnover_stats`.

use poise::CreateReply;
use tracing::instrument;

use crate::clips;
use crate::embeds;
use crate::BotError;
use crate::Context;

/// Play a random football turnover clip.
#[instrument(skip(ctx))]
#[poise::command(slash_command, channel_cooldown = 3)]
pub async fn turnover(ctx: Context<'_>) -> Result<(), BotError> {
    let Some(url) = ctx.data().clips.random() else {
        ctx.send(CreateReply::default().embed(embeds::no_clips()))
            .await?;
        return Ok(());
    };

    let info = clips::game_info(url);
    tracing::info!("Sending turnover clip: {info}");

    // A bare link so Discord embeds the video itself.
    ctx.say(format!("🏈 **TURNOVER!** {info}\n{url}")).await?;
    Ok(())
}

/// Show statistics about the turnover clip database.
#[instrument(skip(ctx))]
#[poise::command(slash_command)]
pub async fn turnover_stats(ctx: Context<'_>) -> Result<(), BotError> {
    let library = &ctx.data().clips;
    let embed = embeds::clip_stats(library.len(), &library.clips_by_year());
    ctx.send(CreateReply::default().embed(embed)).await?;
    Ok(())
}
