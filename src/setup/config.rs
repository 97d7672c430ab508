//! Configuration for running this bot.

use std::collections::HashSet;
use std::time::Duration;

use poise::Framework;
use serde::Deserialize;
use serde::Serialize;
use serenity::GuildId;
use serenity::UserId;

use crate::error::ConfigError;
use crate::serenity;
use crate::trivia::session::DEFAULT_ROUND_TIMEOUT;

/// The path to the config file
const CONFIG_PATH: &str = "config.toml";

/// Settings read from [CONFIG_PATH] that modify bot behavior.
#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Token needed to use a bot account.
    discord_token: String,

    /// Where the questions live, e.g. `sqlite://xelbot.db`.
    database_url: String,

    /// See [GameConfig]
    game: GameConfig,

    /// See [ClipsConfig]
    clips: ClipsConfig,

    /// See [LoggingConfig]
    logging: LoggingConfig,

    /// Useful developer specific configs.
    dev_utils: DevConfig,
}

impl Config {
    /// Tries to read [CONFIG_PATH] to extract a [Config].
    /// If a file doesn't exists, create the default config file and returns error.
    /// If a file exists but is empty, re-write the default values and return error.
    /// If a file exists but is incomplete or invalid, show error and don't change files.
    /// If file existance is indeterminent (e.g. missing permissions), return error.
    pub fn read() -> Result<Config, ConfigError> {
        match std::fs::read_to_string(CONFIG_PATH) {
            Ok(content) if content.trim().is_empty() => {
                write_file(&Config::default())?;
                Err(ConfigError::InvalidConfig {
                    reason: format!("Empty config file! Rewriting {CONFIG_PATH} ..."),
                })
            }
            Ok(content) => Config::from_toml(&content),
            Err(file_error) => match file_error.kind() {
                std::io::ErrorKind::NotFound => {
                    write_file(&Config::default())?;
                    Err(ConfigError::MissingConfig {
                        action_msg: format!("Creating {CONFIG_PATH}..."),
                    })
                }
                _ => Err(ConfigError::IoError(file_error)),
            },
        }
    }

    /// Parse a config from TOML. Errors name the offending key.
    pub fn from_toml(content: &str) -> Result<Config, ConfigError> {
        let to_toml = toml::Deserializer::new(content);
        let config: Config =
            serde_path_to_error::deserialize(to_toml).map_err(|error| ConfigError::InvalidConfig {
                reason: error.to_string(),
            })?;

        if config.game.round_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig {
                reason: "game.round_timeout_secs must be at least 1".to_string(),
            });
        }

        Ok(config)
    }

    /// Basic sanity check for if a token was given.
    pub fn token(&self) -> Result<&str, ConfigError> {
        let default_token = Config::default().discord_token;
        let given_token = self.discord_token.trim();

        if given_token.is_empty() || given_token.contains(&default_token) {
            Err(ConfigError::InvalidConfig {
                reason: "Missing discord token".to_string(),
            })
        } else {
            Ok(given_token)
        }
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// How long players get to answer a clue.
    pub fn round_timeout(&self) -> Duration {
        Duration::from_secs(self.game.round_timeout_secs)
    }

    /// Should the bundled sample questions be added on startup.
    pub fn seed_samples(&self) -> bool {
        self.game.seed_sample_questions
    }

    pub fn turnover_csv(&self) -> &str {
        &self.clips.turnover_csv
    }

    /// Construct a bug notification notify list based on the config.
    /// Wrapper for [NotifyConfig::notify_list]
    pub fn notify_list<U, E>(&self, fw: &Framework<U, E>) -> HashSet<UserId> {
        self.dev_utils.notifications.notify_list(&fw.options().owners)
    }

    /// Getter for log_dir.
    pub fn log_dir(&self) -> &str {
        &self.logging.log_dir
    }

    /// Is debug mode enabled for console logs
    pub fn console_debug(&self) -> bool {
        self.logging.console_debug
    }

    /// Is file logging enabled.
    pub fn logs_enabled(&self) -> bool {
        self.logging.logs_enabled
    }

    pub fn dev_guild(&self) -> Option<GuildId> {
        self.dev_utils.dev_guild
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discord_token: "put_token_here".to_string(),
            database_url: "sqlite://xelbot.db".to_string(),

            game: GameConfig {
                round_timeout_secs: DEFAULT_ROUND_TIMEOUT.as_secs(),
                seed_sample_questions: true,
            },

            clips: ClipsConfig {
                turnover_csv: "data/turnovers.csv".to_string(),
            },

            logging: LoggingConfig {
                console_debug: false,
                logs_enabled: true,
                log_dir: "logs".to_string(),
            },

            dev_utils: DevConfig {
                dev_guild: None,
                notifications: NotifyConfig {
                    enabled: false,
                    add_owners: true,
                    userids: vec![],
                },
            },
        }
    }
}

/// Game rules.
#[derive(Debug, Serialize, Deserialize)]
struct GameConfig {
    /// Seconds players get to answer a clue.
    round_timeout_secs: u64,
    /// Add the bundled sample questions on startup?
    seed_sample_questions: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClipsConfig {
    /// CSV file listing turnover clip URLs.
    turnover_csv: String,
}

/// Configs for logging output.
#[derive(Debug, Serialize, Deserialize)]
struct LoggingConfig {
    /// Print debug traces to console?
    console_debug: bool,
    /// Enable writing to log file?
    logs_enabled: bool,
    /// Directory to store log files
    log_dir: String,
}

/// Optional configs to enable developer-specific behavior.
#[derive(Debug, Serialize, Deserialize)]
struct DevConfig {
    /// Optional guild to automatically update commands quickly.
    #[serde(serialize_with = "serialize_opt", deserialize_with = "deserialize_opt")]
    dev_guild: Option<GuildId>,
    /// See [NotifyConfig]
    notifications: NotifyConfig,
}

/// Configs for notification behavior when encountering unexpected errors.
#[derive(Debug, Serialize, Deserialize)]
struct NotifyConfig {
    /// Enable this behavior or not. (bot sends a private message)
    enabled: bool,
    /// Whether to automatically add owners to the notify list.
    add_owners: bool,
    /// Additional users to add to the notify list.
    userids: Vec<UserId>,
}

impl NotifyConfig {
    /// Construct a bug notification notify list from the config and the bot owners.
    fn notify_list(&self, owners: &HashSet<UserId>) -> HashSet<UserId> {
        if !self.enabled {
            return HashSet::new();
        }

        let owners = owners.iter().filter(|_| self.add_owners);
        owners.chain(&self.userids).copied().collect()
    }
}

/// Write the given config to [CONFIG_PATH].
fn write_file(config: &Config) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config).expect("config serialization can't fail");
    std::fs::write(CONFIG_PATH, content).map_err(ConfigError::IoError)
}

fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<GuildId>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserializer.deserialize_str(OptVisitor)
}

fn serialize_opt<T, S>(val: &Option<T>, ser: S) -> Result<S::Ok, S::Error>
where
    T: serde::Serialize,
    S: serde::Serializer,
{
    match val {
        Some(v) => v.serialize(ser),
        None => ser.serialize_str(""),
    }
}

/// Reads a guild id written as a string, `""` meaning none.
struct OptVisitor;

impl serde::de::Visitor<'_> for OptVisitor {
    type Value = Option<GuildId>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a valid guild id")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        match v {
            "" => Ok(None),
            _ => {
                let num: u64 = v.parse().map_err(|_| E::custom("not u64"))?;
                Ok(Some(GuildId::new(num)))
            }
        }
    }
}
