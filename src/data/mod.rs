//! This module contains everything relating to [Data].

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use serenity::UserId;

use crate::clips::ClipLibrary;
use crate::notify::DiscordNotifier;
use crate::serenity;
use crate::store::Store;
use crate::trivia::ChannelKey;
use crate::trivia::SessionRegistry;
use crate::trivia::Submitter;
use crate::Context;

/// The data kept between shards
#[derive(Debug)]
pub struct Data {
    /// List of users to send bug notifications
    pub notify_list: HashSet<UserId>,
    /// Questions and the mirror of active rounds.
    pub store: Store,
    /// Every active round, keyed by channel.
    pub sessions: SessionRegistry,
    /// Same notifier the [SessionRegistry] uses for timeouts.
    pub notifier: Arc<DiscordNotifier>,
    /// Clips for `/turnover`.
    pub clips: ClipLibrary,
    /// When the bot became ready.
    pub started_at: Instant,
}

/// Shortcuts from a command [Context] to the game.
pub trait GetData {
    /// The channel the command was used in.
    fn channel_key(&self) -> ChannelKey;
    /// The registry of active rounds.
    fn sessions(&self) -> &SessionRegistry;
}

impl GetData for Context<'_> {
    fn channel_key(&self) -> ChannelKey {
        self.channel_id().into()
    }

    fn sessions(&self) -> &SessionRegistry {
        &self.data().sessions
    }
}

impl From<&serenity::Message> for Submitter {
    /// Uses the author's server nickname when there is one.
    fn from(message: &serenity::Message) -> Self {
        let author = &message.author;
        let nick = message.member.as_ref().and_then(|m| m.nick.as_deref());
        Submitter {
            id: author.id.get(),
            display_name: display_name(nick, author.global_name.as_deref(), &author.name)
                .to_string(),
        }
    }
}

/// The name a server shows for someone: nickname, then global name, then username.
fn display_name<'a>(nick: Option<&'a str>, global_name: Option<&'a str>, name: &'a str) -> &'a str {
    nick.or(global_name).unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nickname_wins_over_account_names() {
        assert_eq!(display_name(Some("Ken"), Some("Ken J."), "ken_j"), "Ken");
        assert_eq!(display_name(None, Some("Ken J."), "ken_j"), "Ken J.");
        assert_eq!(display_name(None, None, "ken_j"), "ken_j");
    }
}
