//! Error types.
//!
//! [UserError]s are shown to whoever used the command and are not bugs.
//! Everything else in [BotError] is unexpected and gets logged as an error.

use std::time::Duration;

use serenity::Permissions;
use thiserror::Error;

use crate::serenity;
use crate::store::StoreError;
use crate::trivia::GameError;

/// Top level error of the bot.
#[derive(Error, Debug)]
pub enum BotError {
    #[error(transparent)]
    UserError(#[from] UserError),
    #[error("Discord error: {0}")]
    Serenity(#[from] serenity::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Command panicked: {}", .payload.as_deref().unwrap_or("<no payload>"))]
    Panic { payload: Option<String> },
    #[error("Command structure mismatch: {description}")]
    CommandStructureMismatch { description: String },
    #[error("Check failed: {}", .reason.as_deref().unwrap_or("no reason given"))]
    CheckFailed { reason: Option<String> },
}

impl From<GameError> for BotError {
    fn from(error: GameError) -> Self {
        BotError::UserError(error.into())
    }
}

/// Errors caused by users, these are replied to but otherwise harmless.
#[derive(Error, Debug)]
pub enum UserError {
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(
        "No Jeopardy questions found in the database. Please wait while we gather more questions."
    )]
    NoQuestions,
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },
    #[error("Couldn't understand '{}'.", .input.as_deref().unwrap_or_default())]
    BadArgs { input: Option<String> },
    #[error("Slow down! Try again in {:.1} seconds.", .remaining_cooldown.as_secs_f32())]
    OnCooldown { remaining_cooldown: Duration },
    #[error("I need these permissions to do that: {}", .missing_permissions.get_permission_names().join(", "))]
    MissingBotPermissions { missing_permissions: Permissions },
    #[error("You don't have permission to use this command{}", user_permissions(.missing_permissions))]
    MissingUserPermissions {
        missing_permissions: Option<Permissions>,
    },
    #[error("This command only works in a server.")]
    GuildOnly,
}

/// Lists missing permissions, if they're known.
fn user_permissions(missing: &Option<Permissions>) -> String {
    match missing {
        Some(perms) if !perms.is_empty() => {
            format!(", you need: {}.", perms.get_permission_names().join(", "))
        }
        _ => ".".to_string(),
    }
}

/// Errors while reading the config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },
    #[error("Missing config file. {action_msg}")]
    MissingConfig { action_msg: String },
    #[error("Could not access config file: {0}")]
    IoError(std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_errors_read_like_replies() {
        let error: BotError = GameError::AlreadyActive.into();
        assert!(matches!(
            error,
            BotError::UserError(UserError::Game(GameError::AlreadyActive))
        ));
        assert_eq!(
            error.to_string(),
            "There's already a Jeopardy game running in this channel! Answer the current question first."
        );
    }

    #[test]
    fn framework_rejections_read_like_replies() {
        assert_eq!(
            UserError::GuildOnly.to_string(),
            "This command only works in a server."
        );
        let error = UserError::OnCooldown {
            remaining_cooldown: Duration::from_millis(1500),
        };
        assert_eq!(error.to_string(), "Slow down! Try again in 1.5 seconds.");
    }

    #[test]
    fn missing_user_permissions_are_listed() {
        let error = UserError::MissingUserPermissions {
            missing_permissions: Some(Permissions::MANAGE_MESSAGES),
        };
        assert_eq!(
            error.to_string(),
            "You don't have permission to use this command, you need: Manage Messages."
        );

        let error = UserError::MissingUserPermissions {
            missing_permissions: None,
        };
        assert_eq!(
            error.to_string(),
            "You don't have permission to use this command."
        );
    }
}
