//! Gateway event handling. Chat messages are how players answer.

use poise::FrameworkContext;
use tracing::instrument;

use crate::serenity;
use crate::trivia::Announcement;
use crate::trivia::Notifier;
use crate::trivia::session::Submission;
use crate::BotError;
use crate::Data;

/// Entry point for every gateway event the framework doesn't consume itself.
pub async fn handle_event(
    _ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: FrameworkContext<'_, Data, BotError>,
    data: &Data,
) -> Result<(), BotError> {
    if let serenity::FullEvent::Message { new_message } = event {
        on_message(new_message, data).await;
    }
    Ok(())
}

/// Treat a chat message as an answer to the round in its channel, if any.
#[instrument(skip_all, fields(channel = %message.channel_id))]
async fn on_message(message: &serenity::Message, data: &Data) {
    if message.author.bot {
        return;
    }

    let channel = message.channel_id.into();
    // Most messages aren't answers, skip them before touching the round lock.
    if !data.sessions.is_active(channel).await {
        return;
    }

    let submission = data
        .sessions
        .submit_answer(channel, message.content.trim(), message.into())
        .await;

    // No round (it just ended) or a wrong answer: stay quiet.
    let Ok(Submission::Correct(correct)) = submission else {
        return;
    };

    tracing::info!(
        "{} answered question {} correctly.",
        correct.submitter.display_name,
        correct.question.id
    );
    if let Err(e) = data
        .notifier
        .announce(channel, Announcement::Correct(correct))
        .await
    {
        tracing::warn!("{e}");
    }
}
