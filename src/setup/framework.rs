//! Setup for [poise::Framework]

use std::sync::Arc;
use std::time::Instant;

use crate::clips::ClipLibrary;
use crate::commands;
use crate::notify::DiscordNotifier;
use crate::serenity;
use crate::store::Store;
use crate::trivia::SessionRegistry;
use crate::BotError;
use crate::Config;
use crate::Data;

/// Convenient type alias, only this [poise::Framework] type is used.
type Framework = poise::Framework<Data, BotError>;

/// Construct a [poise::Framework]
pub(super) fn framework(config: Config, store: Store, clips: ClipLibrary) -> Framework {
    poise::Framework::builder()
        .options(framework_options())
        .setup(|ctx, rdy, fw| framework_setup(ctx, rdy, fw, config, store, clips))
        .build()
}

/// Configure options for the [Framework]
fn framework_options() -> poise::FrameworkOptions<Data, BotError> {
    poise::FrameworkOptions {
        // Add commands to the framework
        commands: commands::list(),
        // Answers arrive as plain messages
        event_handler: |ctx, event, fw, data| {
            Box::pin(crate::events::handle_event(ctx, event, fw, data))
        },
        // Handle framework errors
        on_error: |e| crate::log::handle_framework_error(e),
        // Log when commands start
        pre_command: |ctx| {
            Box::pin(async move {
                let cmd_name = &ctx.command().name;
                let user = &ctx.author().name;
                tracing::info!("Started '{cmd_name}' command from {user}.")
            })
        },
        // Log when finishing commands
        post_command: |ctx| {
            Box::pin(async move {
                let cmd_name = &ctx.command().name;
                let user = &ctx.author().name;
                tracing::info!("Finished '{cmd_name}' command from {user}.")
            })
        },
        ..Default::default()
    }
}

/// Construct future that runs on startup
fn framework_setup<'a>(
    ctx: &'a serenity::Context,
    rdy: &'a serenity::Ready,
    fw: &'a Framework,
    config: Config,
    store: Store,
    clips: ClipLibrary,
) -> poise::BoxFuture<'a, Result<Data, BotError>> {
    Box::pin(async move {
        // Register the commands
        let app_commands = poise::builtins::create_application_commands(&fw.options().commands);

        serenity::Command::set_global_commands(ctx, app_commands.clone()).await?;
        if let Some(dev_guild) = config.dev_guild() {
            // This is faster than global registers, useful for development.
            tracing::info!("Registering commands on dev guild.");
            dev_guild.set_commands(ctx, app_commands).await?;
        }

        let notifier = Arc::new(DiscordNotifier::new(ctx.http.clone()));
        let sessions = SessionRegistry::new(
            config.round_timeout(),
            Arc::new(store.clone()),
            notifier.clone(),
        );

        let bot_name = &rdy.user.name;
        tracing::info!("{bot_name} is ready!");

        Ok(Data {
            notify_list: config.notify_list(fw),
            store,
            sessions,
            notifier,
            clips,
            started_at: Instant::now(),
        })
    })
}
