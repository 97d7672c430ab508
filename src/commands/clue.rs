//! Implements the `/clue` command.
//!
//! Starts a round in the current channel with a random question. Players
//! answer by chatting, see [crate::events].

use poise::CreateReply;
use tracing::instrument;

use crate::data::GetData;
use crate::embeds;
use crate::error::UserError;
use crate::trivia::GameError;
use crate::trivia::QuestionSource;
use crate::BotError;
use crate::Context;

/// Start a Jeopardy game with a random clue.
#[instrument(skip(ctx))]
#[poise::command(slash_command, channel_cooldown = 2)]
pub async fn clue(ctx: Context<'_>) -> Result<(), BotError> {
    let channel = ctx.channel_key();
    let sessions = ctx.sessions();

    // Saves a query, start_round still has the final say.
    if sessions.is_active(channel).await {
        Err(GameError::AlreadyActive)?
    }

    let question = ctx
        .data()
        .store
        .random_question()
        .await?
        .ok_or(UserError::NoQuestions)?;
    let round = sessions.start_round(channel, question).await?;

    let reply = CreateReply::default().embed(embeds::clue(&round.question, round.time_limit));
    if let Err(e) = ctx.send(reply).await {
        // Nobody saw the clue.
        if let Err(end_error) = sessions.end_round(channel).await {
            tracing::debug!("Round was already over. {end_error}");
        }
        return Err(e.into());
    }

    Ok(())
}
