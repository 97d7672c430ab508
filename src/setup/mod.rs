//! Builds the Discord client.

mod config;
mod framework;

use crate::clips::ClipLibrary;
use crate::serenity;
use crate::store::Store;
use crate::BotError;

pub use config::Config;

/// Constructs a [serenity::Client] running the game.
pub(super) async fn client(
    config: Config,
    store: Store,
    clips: ClipLibrary,
) -> Result<serenity::Client, BotError> {
    // Get discord token from config file
    let token = config.token()?.to_string();

    // Answers are read from chat, which needs the privileged message content intent.
    // See https://discord.com/developers/docs/topics/gateway#gateway-intents
    let intents =
        serenity::GatewayIntents::non_privileged() | serenity::GatewayIntents::MESSAGE_CONTENT;

    let client = serenity::ClientBuilder::new(token, intents)
        .framework(framework::framework(config, store, clips))
        .await?;

    Ok(client)
}
