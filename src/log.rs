//! Logging functionality and error reporting.
//! The logging library of choice is [tracing].

use futures::future::join_all;
use poise::BoxFuture;
use poise::CreateReply;
use poise::FrameworkError;
use serenity::CreateMessage;
use tracing::debug;
use tracing::error;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::Targets, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer,
};

use crate::error::UserError;
use crate::serenity;
use crate::BotError;
use crate::Config;
use crate::Context;
use crate::Data;

/// The name of this crate, used to set filter target.
const THIS_CRATE: &str = env!("CARGO_CRATE_NAME");

/// Setup format layers, tracing subscribers, and installs tracing.
///
/// The returned guard flushes the log file when dropped, keep it alive in `main`.
pub(super) fn install_tracing(config: &Config) -> Option<WorkerGuard> {
    let debug = config.console_debug();
    let timer = fmt::time::ChronoLocal::rfc_3339();

    // INFO and above by default. Gateway and query chatter only when it warns.
    let target = Targets::new()
        .with_default(LevelFilter::INFO)
        .with_target("serenity", LevelFilter::WARN)
        .with_target("sqlx", LevelFilter::WARN)
        .with_target(
            THIS_CRATE,
            if debug {
                LevelFilter::DEBUG
            } else {
                LevelFilter::INFO
            },
        );

    let console_layer = fmt::layer()
        .with_ansi(true)
        .with_file(debug)
        .with_line_number(debug)
        .with_level(true)
        .with_target(true)
        .with_timer(timer.clone())
        .pretty()
        .with_filter(target.clone());

    // Same events as the console, rotated hourly as "{log_dir}/{THIS_CRATE}.log.{TIMESTAMP}".
    let (file_layer, guard) = if config.logs_enabled() {
        let appender = tracing_appender::rolling::hourly(config.log_dir(), format!("{THIS_CRATE}.log"));
        let (writer, guard) = tracing_appender::non_blocking(appender);

        let layer = fmt::layer()
            .with_ansi(false)
            .with_file(debug)
            .with_line_number(debug)
            .with_level(true)
            .with_target(true)
            .with_timer(timer)
            .with_writer(writer)
            .compact()
            .with_filter(target);

        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}

/// Defines various behaviors for how to handle errors.
///
/// [UserError]s and framework rejections (cooldowns, permissions, ...) get an
/// ephemeral reply. Unexpected errors are logged as errors and reported to the
/// notify list.
pub fn handle_framework_error(err: FrameworkError<Data, BotError>) -> BoxFuture<()> {
    let handler = async move {
        match err {
            // Invisible to users.
            FrameworkError::Setup { error, .. } => error!("Error during startup: {error}"),
            FrameworkError::EventHandler { error, event, .. } => {
                error!("Error while handling event. Event: {event:?} Error: {error}")
            }

            // Users see these, but nothing went wrong.
            FrameworkError::Command {
                error: BotError::UserError(user_error),
                ctx,
                ..
            } => reply_user_error(&ctx, user_error, None).await,
            FrameworkError::ArgumentParse {
                error, input, ctx, ..
            } => reply_user_error(&ctx, UserError::BadArgs { input }, Some(error.to_string())).await,
            FrameworkError::CooldownHit {
                remaining_cooldown,
                ctx,
                ..
            } => reply_user_error(&ctx, UserError::OnCooldown { remaining_cooldown }, None).await,
            FrameworkError::MissingBotPermissions {
                missing_permissions,
                ctx,
                ..
            } => {
                let user_error = UserError::MissingBotPermissions {
                    missing_permissions,
                };
                reply_user_error(&ctx, user_error, None).await
            }
            FrameworkError::MissingUserPermissions {
                missing_permissions,
                ctx,
                ..
            } => {
                let user_error = UserError::MissingUserPermissions {
                    missing_permissions,
                };
                reply_user_error(&ctx, user_error, None).await
            }
            FrameworkError::GuildOnly { ctx, .. } => {
                reply_user_error(&ctx, UserError::GuildOnly, None).await
            }
            FrameworkError::CommandCheckFailed { error, ctx, .. } => {
                let error = BotError::CheckFailed {
                    reason: error.map(|e| e.to_string()),
                };

                Response::builder()
                    .ctx(&ctx)
                    .reply(error.to_string())
                    .source(error)
                    .build()
                    .send()
                    .await;
            }

            // Unexpected, these are bugs and get reported.
            FrameworkError::Command { error, ctx, .. } => {
                Response::builder()
                    .ctx(&ctx)
                    .reply("Something went wrong... A bug report has been sent.")
                    .source(error)
                    .notify(true)
                    .is_error(true)
                    .build()
                    .send()
                    .await;
            }
            FrameworkError::CommandPanic { payload, ctx, .. } => {
                Response::builder()
                    .ctx(&ctx)
                    .reply("Something went horribly wrong... A bug report has been sent.")
                    .source(BotError::Panic { payload })
                    .notify(true)
                    .is_error(true)
                    .build()
                    .send()
                    .await;
            }
            FrameworkError::CommandStructureMismatch {
                description, ctx, ..
            } => {
                let error = BotError::CommandStructureMismatch {
                    description: description.to_string(),
                };

                Response::builder()
                    .ctx(&ctx.into())
                    .reply("Command structure mismatch. Please wait until discord catches up to a bot update.")
                    .source(error)
                    .notify(true)
                    .is_error(true)
                    .build()
                    .send()
                    .await;
            }

            // Nothing registered can raise these.
            FrameworkError::UnknownCommand { .. } => {
                error!("Prefix commands are not supported.")
            }
            FrameworkError::UnknownInteraction { interaction, .. } => {
                let name = &interaction.data.name;
                error!("Received unknown interaction: {name}")
            }
            FrameworkError::DynamicPrefix { .. } => {
                error!("Dynamic prefixes are not supported.")
            }
            _ => error!("Unhandled framework error."),
        }
    };

    Box::pin(handler)
}

/// Tell the user what they did wrong, logging only at debug level.
async fn reply_user_error(ctx: &Context<'_>, user_error: UserError, add_info: Option<String>) {
    Response::builder()
        .ctx(ctx)
        .reply(user_error.to_string())
        .source(user_error)
        .maybe_add_info(add_info)
        .build()
        .send()
        .await;
}

/// Sends an ephemeral reply to the [Context] author.
async fn ephemeral_reply(ctx: &Context<'_>, content: impl Into<String>) {
    let reply = CreateReply::default().ephemeral(true).content(content);
    if let Err(e) = ctx.send(reply).await {
        error!("Failed to send ephemeral reply. {e}")
    };
}

/// Sends a notification (via private message) to users in the notify list.
/// If a message fails, only log and don't retry.
async fn notify_bug(ctx: &Context<'_>, content: impl Into<String>) {
    let message = CreateMessage::new().content(content);

    let sends = ctx
        .data()
        .notify_list
        .iter()
        .map(|user| user.direct_message(ctx, message.clone()));

    for result in join_all(sends).await {
        if let Err(e) = result {
            error!("Failed to send bug notification. {e}");
        }
    }
}

/// Helper function to create debug information from [Context]
fn debug_info(ctx: &Context) -> String {
    let user = &ctx.author().name;
    let cmd = &ctx.command().name;
    let channel = ctx.channel_id();
    let user_input = ctx.invocation_string();
    format!("{user} tried to use {cmd} in {channel} with {user_input}.")
}

/// Structured response to errors.
/// Always logs as at least [debug level](tracing::debug), but is upgraded to
/// [error level](tracing::error) if `is_error` is set.
/// Additionally, notify messages are accompanied by [debug info](debug_info).
#[derive(bon::Builder)]
#[builder(on(String, into))]
struct Response<'a> {
    /// The context of the response
    ctx: &'a Context<'a>,
    /// The reason for this reply, usually the error causing the response.
    #[builder(into)]
    source: BotError,
    /// Optional ephemeral reply to user.
    reply: Option<String>,
    /// Additional information to log
    add_info: Option<String>,
    /// Set to `true` to log as error.
    #[builder(default = false)]
    is_error: bool,
    /// Set to `true` to send notifications of the error.
    /// Does nothing if `is_error` is false.
    #[builder(default = false)]
    notify: bool,
}

impl Response<'_> {
    /// Execute the response
    async fn send(&self) {
        let ctx = self.ctx;

        let log_message = match &self.add_info {
            Some(info) => format!("{} | {info}", self.source),
            None => self.source.to_string(),
        };

        if self.is_error {
            error!("{log_message}");
            if self.notify {
                let content = format!("Debug Info: {}\n{log_message}", debug_info(ctx));
                notify_bug(ctx, content).await;
            }
        } else {
            debug!("{log_message}");
        }

        if let Some(ref reply) = self.reply {
            ephemeral_reply(ctx, reply).await;
        }
    }
}
