//! Small commands unrelated to the game.

use std::time::Instant;

use poise::CreateReply;
use rand::Rng;
use serenity::Colour;
use serenity::CreateEmbed;
use serenity::Mentionable;
use tracing::instrument;

use crate::embeds;
use crate::error::UserError;
use crate::serenity;
use crate::BotError;
use crate::Context;

/// Largest maximum `/random` accepts.
const RANDOM_LIMIT: i64 = 1_000_000;

/// Check the bot's latency and response time.
#[instrument(skip(ctx))]
#[poise::command(slash_command, user_cooldown = 2)]
pub async fn ping(ctx: Context<'_>) -> Result<(), BotError> {
    let start = Instant::now();
    let pinging = CreateEmbed::new().title("🏓 Pinging...").colour(Colour::GOLD);
    let handle = ctx.send(CreateReply::default().embed(pinging)).await?;
    let response = start.elapsed();

    let pong = embeds::pong(ctx.ping().await, response);
    handle.edit(ctx, CreateReply::default().embed(pong)).await?;
    Ok(())
}

/// Display information about the bot.
#[instrument(skip(ctx))]
#[poise::command(slash_command, user_cooldown = 5)]
pub async fn info(ctx: Context<'_>) -> Result<(), BotError> {
    let (name, id, avatar) = {
        let me = ctx.cache().current_user();
        (me.name.clone(), me.id.get(), me.face())
    };
    let cache = ctx.cache();

    let info = embeds::BotInfo {
        name,
        id,
        avatar,
        guilds: cache.guild_count(),
        users: cache.user_count(),
        latency: ctx.ping().await,
        uptime: ctx.data().started_at.elapsed(),
    };
    ctx.send(CreateReply::default().embed(embeds::bot_info(&info)))
        .await?;
    Ok(())
}

/// Display information about a user.
#[instrument(skip(ctx))]
#[poise::command(slash_command, user_cooldown = 2)]
pub async fn userinfo(
    ctx: Context<'_>,
    #[description = "The user to get information about (leave empty for yourself)"]
    user: Option<serenity::User>,
) -> Result<(), BotError> {
    let user = user.as_ref().unwrap_or_else(|| ctx.author());

    // Not in a server, or not a member of it.
    let member = match ctx.guild_id() {
        Some(guild) => guild.member(ctx, user.id).await.ok(),
        None => None,
    };

    let info = embeds::UserInfo {
        name: user.name.clone(),
        display_name: member
            .as_ref()
            .map_or(user.display_name(), |m| m.display_name())
            .to_string(),
        id: user.id.get(),
        bot: user.bot,
        avatar: user.face(),
        created_at: user.created_at().unix_timestamp(),
        member: member.as_ref().map(|m| embeds::MemberInfo {
            joined_at: m.joined_at.map(|t| t.unix_timestamp()),
            roles: m.roles.iter().map(|role| role.mention().to_string()).collect(),
        }),
    };

    let requested_by = ctx.author().display_name().to_string();
    ctx.send(CreateReply::default().embed(embeds::user_info(&info, &requested_by)))
        .await?;
    Ok(())
}

/// Generate a random number.
#[instrument(skip(ctx))]
#[poise::command(slash_command)]
pub async fn random(
    ctx: Context<'_>,
    #[description = "Maximum number (default: 100)"] maximum: Option<i64>,
) -> Result<(), BotError> {
    let maximum = checked_maximum(maximum.unwrap_or(100))?;
    let result = rand::thread_rng().gen_range(1..=maximum);

    ctx.send(CreateReply::default().embed(embeds::random_number(result, maximum)))
        .await?;
    Ok(())
}

/// `maximum` as a `/random` upper bound.
fn checked_maximum(maximum: i64) -> Result<u32, UserError> {
    if maximum < 1 {
        return Err(UserError::InvalidInput {
            reason: "Maximum number must be at least 1!".to_string(),
        });
    }
    if maximum > RANDOM_LIMIT {
        return Err(UserError::InvalidInput {
            reason: "Maximum number cannot exceed 1,000,000!".to_string(),
        });
    }
    // In range, so this can't fail.
    Ok(maximum as u32)
}

/// Display available commands and their descriptions.
#[instrument(skip(ctx))]
#[poise::command(slash_command)]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Command to show help about"]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> Result<(), BotError> {
    let config = poise::builtins::HelpConfiguration {
        extra_text_at_bottom: "Start a game with /clue and answer in chat!",
        ephemeral: true,
        ..Default::default()
    };
    poise::builtins::help(ctx, command.as_deref(), config).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maximum_must_be_in_range() {
        assert_eq!(checked_maximum(1).unwrap(), 1);
        assert_eq!(checked_maximum(100).unwrap(), 100);
        assert_eq!(checked_maximum(RANDOM_LIMIT).unwrap(), 1_000_000);

        for bad in [0, -5, RANDOM_LIMIT + 1] {
            assert!(matches!(
                checked_maximum(bad),
                Err(UserError::InvalidInput { .. })
            ));
        }
    }
}
