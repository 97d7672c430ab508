//! A Discord bot that hosts Jeopardy rounds in text channels.

mod clips;
mod commands;
mod data;
mod embeds;
mod error;
mod events;
mod log;
mod notify;
mod setup;
mod store;
mod trivia;

use poise::serenity_prelude as serenity;

use data::Data;
use error::BotError;
use setup::Config;

/// Convenient type alias, only this [poise::Context] type is used.
type Context<'a> = poise::Context<'a, Data, BotError>;

#[tokio::main]
async fn main() {
    // Config errors can't be logged yet.
    let config = match Config::read() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return;
        }
    };

    // Dropping this stops file logging, keep it for the lifetime of the bot.
    let _guard = log::install_tracing(&config);

    if let Err(e) = run(config).await {
        tracing::error!("{e}");
    }
}

/// Prepare everything the bot needs, then run until the connection ends.
async fn run(config: Config) -> Result<(), BotError> {
    let store = store::Store::connect(config.database_url()).await?;

    let reset = store.reset_sessions().await?;
    if reset > 0 {
        tracing::info!("Cleared {reset} rounds left over from the last run.");
    }
    if config.seed_samples() {
        store.seed_samples().await?;
    }

    let clips = clips::ClipLibrary::load(config.turnover_csv());

    let mut client = setup::client(config, store, clips).await?;
    client.start().await?;

    Ok(())
}
