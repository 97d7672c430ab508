//! Bot commands.

mod clue;
mod endgame;
mod stats;
mod turnover;
mod utility;

use crate::{BotError, Data};

/// Convenient type alias for [poise::Command].
pub type Command = poise::Command<Data, BotError>;

/// Lists all the implemented commands
pub fn list() -> Vec<Command> {
    vec![
        clue::clue(),
        endgame::endgame(),
        stats::jeopardy_stats(),
        turnover::turnover(),
        turnover::turnover_stats(),
        utility::ping(),
        utility::info(),
        utility::userinfo(),
        utility::random(),
        utility::help(),
    ]
}
