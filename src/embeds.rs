//! Embeds the bot posts.

use std::time::Duration;

use itertools::Itertools;
use serenity::Colour;
use serenity::CreateEmbed;
use serenity::CreateEmbedFooter;

use crate::serenity;
use crate::store::QuestionStats;
use crate::trivia::CorrectAnswer;
use crate::trivia::Question;

/// A new clue, players answer in chat.
pub fn clue(question: &Question, time_limit: Duration) -> CreateEmbed {
    CreateEmbed::new()
        .title("🎯 Jeopardy Clue")
        .description(&question.clue)
        .colour(Colour::BLUE)
        .field("Category", &question.category, true)
        .fields(value_field(question))
        .field("Time Limit", format!("{} seconds", time_limit.as_secs()), true)
        .footer(CreateEmbedFooter::new(
            "Type your answer in chat! Remember to phrase as a question.",
        ))
}

/// Someone answered correctly.
pub fn correct(answer: &CorrectAnswer) -> CreateEmbed {
    let question = &answer.question;
    let embed = CreateEmbed::new()
        .title("🎉 Correct!")
        .description(format!("**{}** got it right!", answer.submitter.display_name))
        .colour(Colour::DARK_GREEN)
        .field("Answer", &question.answer, false)
        .field("Category", &question.category, true)
        .fields(value_field(question))
        .field(
            "Time",
            format!("{:.1} seconds", answer.elapsed.as_secs_f64()),
            true,
        );

    match &question.air_date {
        Some(air_date) => {
            embed.footer(CreateEmbedFooter::new(format!("Originally aired: {air_date}")))
        }
        None => embed,
    }
}

/// Nobody answered in time.
pub fn time_up(question: &Question) -> CreateEmbed {
    CreateEmbed::new()
        .title("⏰ Time's Up!")
        .description(format!("The correct answer was: **{}**", question.answer))
        .colour(Colour::RED)
        .field("Category", &question.category, true)
        .fields(value_field(question))
}

/// A moderator ended the round.
pub fn game_ended(question: &Question) -> CreateEmbed {
    CreateEmbed::new()
        .title("🛑 Game Ended")
        .description("The game has been ended by a moderator.")
        .colour(Colour::ORANGE)
        .field("Correct Answer", &question.answer, false)
        .field("Category", &question.category, true)
}

/// Database totals, `active_games` is how many channels have a round running.
pub fn question_stats(stats: &QuestionStats, active_games: i64) -> CreateEmbed {
    let embed = CreateEmbed::new()
        .title("📊 Jeopardy Statistics")
        .colour(Colour::BLUE);

    if stats.total == 0 {
        return embed.description("No questions in database yet. Please wait while we gather data.");
    }

    let embed = embed
        .field("Total Questions", thousands(stats.total), true)
        .field("Categories", thousands(stats.categories), true);
    let embed = match &stats.latest_air_date {
        Some(latest) => embed.field("Latest Episode", latest, true),
        None => embed,
    };
    embed.field("Active Games", thousands(active_games), true)
}

/// The clip library is empty.
pub fn no_clips() -> CreateEmbed {
    CreateEmbed::new()
        .title("🏈 No Turnover Clips Available")
        .description("The turnover clip database is currently empty.")
        .colour(Colour::ORANGE)
        .field(
            "📝 How to Add Clips",
            "Upload new turnover videos and add their URLs to the clips file in the format:\n`[URL]`",
            false,
        )
}

/// Size of the clip library, broken down by year.
pub fn clip_stats(total: usize, by_year: &[(u32, usize)]) -> CreateEmbed {
    let embed = CreateEmbed::new().title("📊 Turnover Database Stats");

    if total == 0 {
        return embed
            .description("No turnover clips are currently loaded.")
            .colour(Colour::GOLD);
    }

    let embed = embed
        .description(format!("Database contains **{total}** turnover clips"))
        .colour(Colour::BLUE);
    let embed = if by_year.is_empty() {
        embed
    } else {
        let years = by_year
            .iter()
            .map(|(year, count)| format!("**{year}**: {count} clips"))
            .join("\n");
        embed.field("📅 Clips by Year", years, false)
    };

    embed.field("🎲 Random Selection", "Use `/turnover` to get a random clip!", false)
}

pub fn pong(latency: Duration, response: Duration) -> CreateEmbed {
    CreateEmbed::new()
        .title("🏓 Pong!")
        .colour(Colour::DARK_GREEN)
        .field("🌐 API Latency", format!("{}ms", latency.as_millis()), true)
        .field("⚡ Response Time", format!("{}ms", response.as_millis()), true)
}

pub fn random_number(result: u32, maximum: u32) -> CreateEmbed {
    CreateEmbed::new()
        .title("🎲 Random Number")
        .description(format!("**Result:** {result}"))
        .colour(Colour::DARK_GREEN)
        .field("Range", format!("1 - {maximum}"), true)
}

/// Facts about the running bot, for `/info`.
#[derive(Debug)]
pub struct BotInfo {
    pub name: String,
    pub id: u64,
    pub avatar: String,
    pub guilds: usize,
    pub users: usize,
    pub latency: Duration,
    pub uptime: Duration,
}

pub fn bot_info(info: &BotInfo) -> CreateEmbed {
    let statistics = format!(
        "**Guilds:** {}\n**Users:** {}\n**Latency:** {}ms",
        info.guilds,
        info.users,
        info.latency.as_millis()
    );
    let runtime = format!(
        "**Uptime:** {}\n**Version:** {} {}",
        uptime(info.uptime),
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    CreateEmbed::new()
        .title(format!("🤖 {}", info.name))
        .colour(Colour::BLUE)
        .thumbnail(&info.avatar)
        .field("📊 Statistics", statistics, true)
        .field("⏱️ Runtime", runtime, true)
        .footer(CreateEmbedFooter::new(format!("Bot ID: {}", info.id)))
}

/// What `/userinfo` knows about someone.
#[derive(Debug)]
pub struct UserInfo {
    pub name: String,
    pub display_name: String,
    pub id: u64,
    pub bot: bool,
    pub avatar: String,
    /// Unix seconds.
    pub created_at: i64,
    /// Only set when the user is a member of the server.
    pub member: Option<MemberInfo>,
}

#[derive(Debug)]
pub struct MemberInfo {
    /// Unix seconds, if known.
    pub joined_at: Option<i64>,
    /// Role mentions.
    pub roles: Vec<String>,
}

pub fn user_info(info: &UserInfo, requested_by: &str) -> CreateEmbed {
    let basic = format!(
        "**Username:** {}\n**Display Name:** {}\n**ID:** {}\n**Bot:** {}",
        info.name,
        info.display_name,
        info.id,
        if info.bot { "Yes" } else { "No" }
    );

    let embed = CreateEmbed::new()
        .title(format!("👤 User Information - {}", info.display_name))
        .colour(Colour::BLUE)
        .thumbnail(&info.avatar)
        .field("📝 Basic Info", basic, true)
        .field("📅 Account Created", discord_date(info.created_at), true)
        .footer(CreateEmbedFooter::new(format!("Requested by {requested_by}")));

    let Some(member) = &info.member else {
        return embed;
    };

    let joined = member.joined_at.map_or("Unknown".to_string(), discord_date);
    let embed = embed.field("📅 Joined Server", joined, true);
    if member.roles.is_empty() {
        embed
    } else {
        let title = format!("🎭 Roles ({})", member.roles.len());
        embed.field(title, role_list(&member.roles), false)
    }
}

/// Formats how long the bot has been up, e.g. `3h 4m 5s`.
pub fn uptime(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, mins, secs) = (total / 3600, total % 3600 / 60, total % 60);
    format!("{hours}h {mins}m {secs}s")
}

/// A date Discord renders in the reader's locale.
fn discord_date(unix: i64) -> String {
    format!("<t:{unix}:D>")
}

/// Up to ten roles, then how many more there are.
fn role_list(roles: &[String]) -> String {
    const SHOWN: usize = 10;

    let shown = roles.iter().take(SHOWN).join(", ");
    if roles.len() > SHOWN {
        format!("{shown}... (+{} more)", roles.len() - SHOWN)
    } else {
        shown
    }
}

/// The "Value" field, if the question has one.
fn value_field(question: &Question) -> Option<(&'static str, String, bool)> {
    question.value.map(|value| ("Value", dollars(value), true))
}

/// Formats board values, e.g. `$1,000`.
pub fn dollars(value: i64) -> String {
    format!("${}", thousands(value))
}

/// Groups digits by thousands, e.g. `12,345`.
pub fn thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let grouped = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| String::from_utf8_lossy(chunk))
        .join(",");

    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
