//! The trivia game core.
//!
//! Nothing in here knows about Discord or SQL. The outside world is reached
//! through the [QuestionSource], [SessionMirror] and [Notifier] traits.

pub mod matcher;
pub mod session;

use std::fmt::Display;
use std::time::Duration;

use async_trait::async_trait;

use crate::store::StoreError;
pub use session::SessionRegistry;

/// Opaque identifier of the channel a round is played in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelKey(pub u64);

impl Display for ChannelKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A Jeopardy question, as stored.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Question {
    pub id: i64,
    pub category: String,
    pub clue: String,
    pub answer: String,
    /// Dollar value on the board.
    pub value: Option<i64>,
    pub air_date: Option<String>,
    /// "Jeopardy", "Double Jeopardy" or "Final Jeopardy".
    pub round_type: Option<String>,
    pub show_number: Option<i64>,
}

/// Whoever sent a submission.
#[derive(Debug, Clone, PartialEq)]
pub struct Submitter {
    pub id: u64,
    pub display_name: String,
}

/// A round won by a correct submission.
#[derive(Debug, Clone)]
pub struct CorrectAnswer {
    pub question: Question,
    pub submitter: Submitter,
    /// Time between the start of the round and the correct submission.
    pub elapsed: Duration,
}

/// Something the game wants posted to a channel.
#[derive(Debug, Clone)]
pub enum Announcement {
    /// Someone answered correctly.
    Correct(CorrectAnswer),
    /// Nobody answered in time, reveals the answer.
    TimeUp(Question),
}

/// Errors the game reports back to whoever asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("There's already a Jeopardy game running in this channel! Answer the current question first.")]
    AlreadyActive,
    #[error("There's no active Jeopardy game in this channel.")]
    NoActiveRound,
}

/// Failure to post an [Announcement].
#[derive(Debug, thiserror::Error)]
#[error("Failed to announce in channel {channel}: {reason}")]
pub struct NotifyError {
    pub channel: ChannelKey,
    pub reason: String,
}

/// Supplies questions for new rounds.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// A random question, `None` if there are none.
    async fn random_question(&self) -> Result<Option<Question>, StoreError>;
}

/// Best-effort persisted copy of which channels have a live round.
#[async_trait]
pub trait SessionMirror: Send + Sync {
    /// Record `question_id` as the live question of `channel`.
    async fn upsert_active_session(
        &self,
        channel: ChannelKey,
        question_id: i64,
        timeout: Duration,
    ) -> Result<(), StoreError>;

    /// Record that `channel` no longer has a live round.
    async fn mark_inactive(&self, channel: ChannelKey) -> Result<(), StoreError>;
}

/// Posts announcements to channels.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn announce(
        &self,
        channel: ChannelKey,
        announcement: Announcement,
    ) -> Result<(), NotifyError>;
}
