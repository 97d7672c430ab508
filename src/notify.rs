//! Posts game announcements to Discord.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serenity::ChannelId;
use serenity::CreateMessage;
use serenity::Http;

use crate::embeds;
use crate::serenity;
use crate::trivia::Announcement;
use crate::trivia::ChannelKey;
use crate::trivia::Notifier;
use crate::trivia::NotifyError;

impl From<ChannelId> for ChannelKey {
    fn from(channel: ChannelId) -> Self {
        ChannelKey(channel.get())
    }
}

impl From<ChannelKey> for ChannelId {
    fn from(key: ChannelKey) -> Self {
        ChannelId::new(key.0)
    }
}

/// [Notifier] that renders announcements as embeds and sends them over HTTP.
#[derive(Clone)]
pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

impl Debug for DiscordNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordNotifier").finish_non_exhaustive()
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn announce(
        &self,
        channel: ChannelKey,
        announcement: Announcement,
    ) -> Result<(), NotifyError> {
        let embed = match &announcement {
            Announcement::Correct(answer) => embeds::correct(answer),
            Announcement::TimeUp(question) => embeds::time_up(question),
        };

        ChannelId::from(channel)
            .send_message(&self.http, CreateMessage::new().embed(embed))
            .await
            .map_err(|e| NotifyError {
                channel,
                reason: e.to_string(),
            })?;

        Ok(())
    }
}
