//! SQLite persistence for questions and the mirror of active rounds.
//!
//! The game never asks the database whether a round is running, the
//! `game_sessions` table only exists for visibility across processes.

mod samples;

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::instrument;

use crate::trivia::ChannelKey;
use crate::trivia::Question;
use crate::trivia::QuestionSource;
use crate::trivia::SessionMirror;
pub use samples::SAMPLE_QUESTIONS;

const CREATE_QUESTIONS: &str = "
CREATE TABLE IF NOT EXISTS jeopardy_questions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    category    TEXT NOT NULL,
    clue        TEXT NOT NULL,
    answer      TEXT NOT NULL,
    value       INTEGER,
    air_date    TEXT,
    round_type  TEXT,
    show_number INTEGER,
    created_at  TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

const CREATE_SESSIONS: &str = "
CREATE TABLE IF NOT EXISTS game_sessions (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    channel_id      TEXT NOT NULL UNIQUE,
    question_id     INTEGER NOT NULL,
    is_active       INTEGER NOT NULL DEFAULT 1,
    timeout_seconds INTEGER NOT NULL DEFAULT 30,
    created_at      TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

const QUESTION_COLUMNS: &str =
    "id, category, clue, answer, value, air_date, round_type, show_number";

/// Errors from the database.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// A question that isn't stored yet.
#[derive(Debug, Clone, Copy)]
pub struct NewQuestion<'a> {
    pub category: &'a str,
    pub clue: &'a str,
    pub answer: &'a str,
    pub value: Option<i64>,
    pub air_date: Option<&'a str>,
    pub round_type: Option<&'a str>,
    pub show_number: Option<i64>,
}

/// Aggregate numbers for `/jeopardy_stats`.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionStats {
    pub total: i64,
    pub categories: i64,
    pub latest_air_date: Option<String>,
}

/// Handle to the database. Internally uses a pool, so it's cheap to clone.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if missing) the database at `url` and make sure the tables exist.
    #[instrument(err)]
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // Every connection to `:memory:` is its own database, so keep exactly one alive.
        let pool_options = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await?;
        let store = Self { pool };
        store.migrate().await?;

        tracing::info!("Connected to database at {url}.");
        Ok(store)
    }

    /// Create missing tables.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in [CREATE_QUESTIONS, CREATE_SESSIONS] {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert a question, returning its id.
    pub async fn insert_question(&self, question: &NewQuestion<'_>) -> Result<i64, StoreError> {
        let result = sqlx::query(
            "INSERT INTO jeopardy_questions
                (category, clue, answer, value, air_date, round_type, show_number)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(question.category)
        .bind(question.clue)
        .bind(question.answer)
        .bind(question.value)
        .bind(question.air_date)
        .bind(question.round_type)
        .bind(question.show_number)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Fetch a question by id.
    #[cfg(test)]
    pub async fn question(&self, id: i64) -> Result<Option<Question>, StoreError> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM jeopardy_questions WHERE id = ?");
        let question = sqlx::query_as::<_, Question>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(question)
    }

    /// Insert every [sample](SAMPLE_QUESTIONS) whose clue isn't stored yet.
    /// Returns how many were added.
    #[instrument(skip(self))]
    pub async fn seed_samples(&self) -> Result<usize, StoreError> {
        let mut added = 0;
        for sample in &SAMPLE_QUESTIONS {
            let existing =
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM jeopardy_questions WHERE clue = ?")
                    .bind(sample.clue)
                    .fetch_one(&self.pool)
                    .await?;
            if existing == 0 {
                self.insert_question(sample).await?;
                added += 1;
            }
        }

        tracing::info!("Added {added} sample questions.");
        Ok(added)
    }

    /// Number of stored questions.
    pub async fn question_count(&self) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM jeopardy_questions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Totals shown by `/jeopardy_stats`.
    pub async fn stats(&self) -> Result<QuestionStats, StoreError> {
        let total = self.question_count().await?;
        let categories =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(DISTINCT category) FROM jeopardy_questions")
                .fetch_one(&self.pool)
                .await?;
        let latest_air_date = sqlx::query_scalar::<_, Option<String>>(
            "SELECT MAX(air_date) FROM jeopardy_questions WHERE air_date IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(QuestionStats {
            total,
            categories,
            latest_air_date,
        })
    }

    /// Number of channels the mirror believes have a live round.
    pub async fn active_session_count(&self) -> Result<i64, StoreError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM game_sessions WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Mark every mirrored round inactive. Rounds don't survive a restart.
    pub async fn reset_sessions(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("UPDATE game_sessions SET is_active = 0 WHERE is_active = 1")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl QuestionSource for Store {
    async fn random_question(&self) -> Result<Option<Question>, StoreError> {
        let sql =
            format!("SELECT {QUESTION_COLUMNS} FROM jeopardy_questions ORDER BY RANDOM() LIMIT 1");
        let question = sqlx::query_as::<_, Question>(&sql)
            .fetch_optional(&self.pool)
            .await?;
        Ok(question)
    }
}

#[async_trait]
impl SessionMirror for Store {
    async fn upsert_active_session(
        &self,
        channel: ChannelKey,
        question_id: i64,
        timeout: Duration,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO game_sessions (channel_id, question_id, is_active, timeout_seconds)
             VALUES (?, ?, 1, ?)
             ON CONFLICT(channel_id) DO UPDATE SET
                question_id = excluded.question_id,
                is_active = 1,
                timeout_seconds = excluded.timeout_seconds,
                created_at = CURRENT_TIMESTAMP",
        )
        .bind(channel.to_string())
        .bind(question_id)
        .bind(timeout.as_secs() as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mark_inactive(&self, channel: ChannelKey) -> Result<(), StoreError> {
        sqlx::query("UPDATE game_sessions SET is_active = 0 WHERE channel_id = ?")
            .bind(channel.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
