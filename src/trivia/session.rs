//! Per-channel round lifecycle.
//!
//! A channel is either idle (absent from the map) or has exactly one active
//! [GameRound]. A round leaves the map in exactly one of three ways, see
//! [Resolution]. Whoever removes it owns the resolution, everyone else gets a no-op.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tokio::time::Instant;
use tracing::instrument;

use super::matcher;
use super::Announcement;
use super::ChannelKey;
use super::CorrectAnswer;
use super::GameError;
use super::Notifier;
use super::Question;
use super::SessionMirror;
use super::Submitter;

/// How long players get to answer when nothing else is configured.
pub const DEFAULT_ROUND_TIMEOUT: Duration = Duration::from_secs(30);

/// Identifies one round, unique for the lifetime of a [SessionRegistry].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoundId(u64);

/// Why a round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Correct,
    Timeout,
    ModeratorEnd,
}

/// An active round.
#[derive(Debug)]
struct GameRound {
    id: RoundId,
    question: Question,
    started_at: Instant,
    /// Handle to the pending timeout task.
    timeout: AbortHandle,
}

/// What a caller gets back after starting a round.
#[derive(Debug, Clone)]
pub struct RoundInfo {
    pub id: RoundId,
    pub question: Question,
    /// Time players have to answer.
    pub time_limit: Duration,
}

/// Outcome of a submission to an active round.
#[derive(Debug, Clone)]
pub enum Submission {
    Correct(CorrectAnswer),
    Incorrect,
}

/// Owns every active round. Cheap to clone, clones share the same rounds.
#[derive(Clone)]
pub struct SessionRegistry {
    inner: Arc<Inner>,
}

struct Inner {
    rounds: Mutex<HashMap<ChannelKey, GameRound>>,
    next_id: AtomicU64,
    time_limit: Duration,
    mirror: Arc<dyn SessionMirror>,
    notifier: Arc<dyn Notifier>,
}

impl Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("time_limit", &self.inner.time_limit)
            .finish_non_exhaustive()
    }
}

impl SessionRegistry {
    pub fn new(
        time_limit: Duration,
        mirror: Arc<dyn SessionMirror>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let inner = Inner {
            rounds: Mutex::default(),
            next_id: AtomicU64::new(1),
            time_limit,
            mirror,
            notifier,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Start a round with `question`, unless `channel` already has one.
    #[instrument(skip(self, question), fields(question = question.id))]
    pub async fn start_round(
        &self,
        channel: ChannelKey,
        question: Question,
    ) -> Result<RoundInfo, GameError> {
        let info = {
            let mut rounds = self.inner.rounds.lock().await;
            let Entry::Vacant(slot) = rounds.entry(channel) else {
                return Err(GameError::AlreadyActive);
            };

            let id = RoundId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
            let timeout = self.spawn_timeout(channel, id);
            slot.insert(GameRound {
                id,
                question: question.clone(),
                started_at: Instant::now(),
                timeout,
            });

            RoundInfo {
                id,
                question,
                time_limit: self.inner.time_limit,
            }
        };

        tracing::info!("Started round {:?} in channel {channel}.", info.id);

        let mirror = self
            .inner
            .mirror
            .upsert_active_session(channel, info.question.id, self.inner.time_limit)
            .await;
        if let Err(e) = mirror {
            tracing::warn!("Failed to persist round in channel {channel}. {e}");
        }

        // The round may have ended while the upsert was in flight, in which case
        // its mark_inactive landed first and would be overwritten.
        if !self.is_current(channel, info.id).await {
            tracing::debug!("Round {:?} ended before it was persisted.", info.id);
            if let Err(e) = self.inner.mirror.mark_inactive(channel).await {
                tracing::warn!("Failed to mark round in channel {channel} inactive. {e}");
            }
        }

        Ok(info)
    }

    /// Check `text` against the active question of `channel`.
    /// A correct answer ends the round.
    #[instrument(skip(self, text, submitter), fields(submitter = submitter.id))]
    pub async fn submit_answer(
        &self,
        channel: ChannelKey,
        text: &str,
        submitter: Submitter,
    ) -> Result<Submission, GameError> {
        let round = {
            let mut rounds = self.inner.rounds.lock().await;
            let Entry::Occupied(entry) = rounds.entry(channel) else {
                return Err(GameError::NoActiveRound);
            };
            if !matcher::is_match(text, &entry.get().question.answer) {
                return Ok(Submission::Incorrect);
            }
            let round = entry.remove();
            round.timeout.abort();
            round
        };

        let correct = CorrectAnswer {
            elapsed: round.started_at.elapsed(),
            question: round.question,
            submitter,
        };
        self.release(channel, Resolution::Correct).await;

        Ok(Submission::Correct(correct))
    }

    /// Force the round in `channel` to end. Returns its question so the answer
    /// can be revealed.
    #[instrument(skip(self))]
    pub async fn end_round(&self, channel: ChannelKey) -> Result<Question, GameError> {
        let round = {
            let mut rounds = self.inner.rounds.lock().await;
            let round = rounds
                .remove(&channel)
                .ok_or(GameError::NoActiveRound)?;
            round.timeout.abort();
            round
        };

        self.release(channel, Resolution::ModeratorEnd).await;

        Ok(round.question)
    }

    /// Runs when the timer of round `id` runs out.
    ///
    /// The round may have been resolved, and even replaced by a newer one, while
    /// the timer was pending. Only the round with the same id is ended.
    #[instrument(skip(self))]
    pub(crate) async fn on_timeout_fired(
        &self,
        channel: ChannelKey,
        id: RoundId,
    ) -> Option<Question> {
        let question = {
            let mut rounds = self.inner.rounds.lock().await;
            if !rounds.get(&channel).is_some_and(|round| round.id == id) {
                tracing::debug!("Timer of round {id:?} fired after it was resolved.");
                return None;
            }
            rounds.remove(&channel)?.question
        };

        let announcement = Announcement::TimeUp(question.clone());
        if let Err(e) = self.inner.notifier.announce(channel, announcement).await {
            tracing::warn!("{e}");
        }
        self.release(channel, Resolution::Timeout).await;

        Some(question)
    }

    /// Whether round `id` is still the active round of `channel`.
    async fn is_current(&self, channel: ChannelKey, id: RoundId) -> bool {
        let rounds = self.inner.rounds.lock().await;
        rounds.get(&channel).is_some_and(|round| round.id == id)
    }

    /// Whether `channel` has an active round.
    pub async fn is_active(&self, channel: ChannelKey) -> bool {
        self.inner.rounds.lock().await.contains_key(&channel)
    }

    /// The question of the active round in `channel`.
    #[cfg(test)]
    pub async fn active_question(&self, channel: ChannelKey) -> Option<Question> {
        let rounds = self.inner.rounds.lock().await;
        rounds.get(&channel).map(|round| round.question.clone())
    }

    /// Number of channels with an active round.
    #[cfg(test)]
    pub async fn active_rounds(&self) -> usize {
        self.inner.rounds.lock().await.len()
    }

    /// Spawn the timer that ends round `id` once the time limit passes.
    fn spawn_timeout(&self, channel: ChannelKey, id: RoundId) -> AbortHandle {
        let registry = self.clone();
        let time_limit = self.inner.time_limit;

        let task = tokio::spawn(async move {
            tokio::time::sleep(time_limit).await;
            registry.on_timeout_fired(channel, id).await;
        });
        task.abort_handle()
    }

    /// Bookkeeping after a round left the map.
    async fn release(&self, channel: ChannelKey, resolution: Resolution) {
        tracing::info!("Round in channel {channel} ended: {resolution:?}.");

        if let Err(e) = self.inner.mirror.mark_inactive(channel).await {
            tracing::warn!("Failed to mark round in channel {channel} inactive. {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use futures::future::join_all;

    use super::*;
    use crate::store::StoreError;
    use crate::trivia::NotifyError;

    const C1: ChannelKey = ChannelKey(1);
    const C2: ChannelKey = ChannelKey(2);

    #[derive(Debug, Clone, PartialEq)]
    enum MirrorCall {
        Upsert(ChannelKey, i64),
        Inactive(ChannelKey),
    }

    #[derive(Default)]
    struct RecordingMirror {
        calls: StdMutex<Vec<MirrorCall>>,
        broken: bool,
        /// How long an upsert takes before it is recorded.
        upsert_delay: Duration,
    }

    impl RecordingMirror {
        fn calls(&self) -> Vec<MirrorCall> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: MirrorCall) -> Result<(), StoreError> {
            self.calls.lock().unwrap().push(call);
            if self.broken {
                Err(StoreError::Sqlx(sqlx::Error::PoolClosed))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl SessionMirror for RecordingMirror {
        async fn upsert_active_session(
            &self,
            channel: ChannelKey,
            question_id: i64,
            _timeout: Duration,
        ) -> Result<(), StoreError> {
            if !self.upsert_delay.is_zero() {
                tokio::time::sleep(self.upsert_delay).await;
            }
            self.record(MirrorCall::Upsert(channel, question_id))
        }

        async fn mark_inactive(&self, channel: ChannelKey) -> Result<(), StoreError> {
            self.record(MirrorCall::Inactive(channel))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: StdMutex<Vec<(ChannelKey, Announcement)>>,
        broken: bool,
    }

    impl RecordingNotifier {
        fn sent(&self) -> Vec<(ChannelKey, Announcement)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn announce(
            &self,
            channel: ChannelKey,
            announcement: Announcement,
        ) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push((channel, announcement));
            if self.broken {
                Err(NotifyError {
                    channel,
                    reason: "Missing Access".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn question(id: i64, answer: &str) -> Question {
        Question {
            id,
            category: "WORLD CAPITALS".to_string(),
            clue: "This city is the capital of France.".to_string(),
            answer: answer.to_string(),
            value: Some(200),
            air_date: Some("2024-01-01".to_string()),
            round_type: Some("Jeopardy".to_string()),
            show_number: Some(1),
        }
    }

    fn alice() -> Submitter {
        Submitter {
            id: 42,
            display_name: "alice".to_string(),
        }
    }

    fn registry_with(
        mirror: &Arc<RecordingMirror>,
        notifier: &Arc<RecordingNotifier>,
    ) -> SessionRegistry {
        SessionRegistry::new(DEFAULT_ROUND_TIMEOUT, mirror.clone(), notifier.clone())
    }

    fn fixtures() -> (SessionRegistry, Arc<RecordingMirror>, Arc<RecordingNotifier>) {
        let mirror = Arc::new(RecordingMirror::default());
        let notifier = Arc::new(RecordingNotifier::default());
        (registry_with(&mirror, &notifier), mirror, notifier)
    }

    async fn wait(secs: u64) {
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_rejected() {
        let (registry, mirror, _) = fixtures();
        let paris = question(1, "What is Paris?");

        registry.start_round(C1, paris.clone()).await.unwrap();
        let second = registry.start_round(C1, question(2, "oxygen")).await;

        assert_eq!(second.unwrap_err(), GameError::AlreadyActive);
        assert_eq!(registry.active_question(C1).await, Some(paris));
        assert_eq!(mirror.calls(), vec![MirrorCall::Upsert(C1, 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn round_resolved_during_slow_upsert_stays_inactive() {
        let mirror = Arc::new(RecordingMirror {
            upsert_delay: Duration::from_millis(50),
            ..Default::default()
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let registry = registry_with(&mirror, &notifier);

        let starting = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.start_round(C1, question(1, "Paris")).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let result = registry.submit_answer(C1, "paris", alice()).await.unwrap();
        assert!(matches!(result, Submission::Correct(_)));
        starting.await.unwrap().unwrap();

        assert!(!registry.is_active(C1).await);
        assert_eq!(
            mirror.calls(),
            vec![
                MirrorCall::Inactive(C1),
                MirrorCall::Upsert(C1, 1),
                MirrorCall::Inactive(C1)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_round_times_out() {
        let (registry, mirror, notifier) = fixtures();
        registry.start_round(C1, question(1, "Paris")).await.unwrap();

        wait(29).await;
        assert!(registry.is_active(C1).await);

        wait(2).await;
        assert!(!registry.is_active(C1).await);
        assert_eq!(registry.active_rounds().await, 0);

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(matches!(&sent[0], (C1, Announcement::TimeUp(q)) if q.id == 1));
        assert_eq!(
            mirror.calls(),
            vec![MirrorCall::Upsert(C1, 1), MirrorCall::Inactive(C1)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn correct_answer_wins_and_cancels_timer() {
        let (registry, mirror, notifier) = fixtures();
        registry
            .start_round(C1, question(1, "What is Paris?"))
            .await
            .unwrap();

        wait(5).await;
        let result = registry
            .submit_answer(C1, "who is paris", alice())
            .await
            .unwrap();

        let Submission::Correct(correct) = result else {
            panic!("expected a correct answer");
        };
        assert_eq!(correct.submitter, alice());
        assert_eq!(correct.question.id, 1);
        assert!(correct.elapsed >= Duration::from_secs(5));
        assert!(correct.elapsed < Duration::from_secs(6));
        assert!(!registry.is_active(C1).await);

        // The timer must not fire later.
        wait(60).await;
        assert!(notifier.sent().is_empty());
        assert_eq!(
            mirror.calls(),
            vec![MirrorCall::Upsert(C1, 1), MirrorCall::Inactive(C1)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_answer_keeps_round_alive() {
        let (registry, _, _) = fixtures();
        registry
            .start_round(C1, question(1, "Correct Answer"))
            .await
            .unwrap();

        let result = registry
            .submit_answer(C1, "wrong answer", alice())
            .await
            .unwrap();

        assert!(matches!(result, Submission::Incorrect));
        assert!(registry.is_active(C1).await);
    }

    #[tokio::test(start_paused = true)]
    async fn submission_without_round_is_rejected() {
        let (registry, mirror, _) = fixtures();

        let result = registry.submit_answer(C1, "paris", alice()).await;

        assert_eq!(result.unwrap_err(), GameError::NoActiveRound);
        assert!(mirror.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn moderator_can_end_round() {
        let (registry, mirror, notifier) = fixtures();
        registry.start_round(C1, question(7, "Paris")).await.unwrap();

        let ended = registry.end_round(C1).await.unwrap();
        assert_eq!(ended.id, 7);
        assert!(!registry.is_active(C1).await);
        assert_eq!(
            registry.end_round(C1).await.unwrap_err(),
            GameError::NoActiveRound
        );

        wait(60).await;
        assert!(notifier.sent().is_empty());
        assert_eq!(
            mirror.calls(),
            vec![MirrorCall::Upsert(C1, 7), MirrorCall::Inactive(C1)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn late_timer_after_correct_answer_is_ignored() {
        let (registry, mirror, notifier) = fixtures();
        let info = registry.start_round(C1, question(1, "Paris")).await.unwrap();

        registry.submit_answer(C1, "paris", alice()).await.unwrap();
        // As if the timer had already been scheduled when the answer arrived.
        let fired = registry.on_timeout_fired(C1, info.id).await;

        assert!(fired.is_none());
        assert!(notifier.sent().is_empty());
        let inactive = mirror
            .calls()
            .into_iter()
            .filter(|call| *call == MirrorCall::Inactive(C1))
            .count();
        assert_eq!(inactive, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_timer_leaves_newer_round_alone() {
        let (registry, _, notifier) = fixtures();
        let first = registry.start_round(C1, question(1, "Paris")).await.unwrap();
        registry.end_round(C1).await.unwrap();
        let second = registry.start_round(C1, question(2, "Oxygen")).await.unwrap();
        assert_ne!(first.id, second.id);

        assert!(registry.on_timeout_fired(C1, first.id).await.is_none());

        assert_eq!(
            registry.active_question(C1).await.map(|q| q.id),
            Some(2)
        );
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn storage_failures_do_not_block_rounds() {
        let mirror = Arc::new(RecordingMirror {
            broken: true,
            ..Default::default()
        });
        let notifier = Arc::new(RecordingNotifier::default());
        let registry = registry_with(&mirror, &notifier);

        registry.start_round(C1, question(1, "Paris")).await.unwrap();
        assert!(registry.is_active(C1).await);

        let result = registry.submit_answer(C1, "paris", alice()).await.unwrap();
        assert!(matches!(result, Submission::Correct(_)));
        assert!(!registry.is_active(C1).await);
        assert_eq!(mirror.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_timeout_notice_still_cleans_up() {
        let mirror = Arc::new(RecordingMirror::default());
        let notifier = Arc::new(RecordingNotifier {
            broken: true,
            ..Default::default()
        });
        let registry = registry_with(&mirror, &notifier);

        registry.start_round(C1, question(1, "Paris")).await.unwrap();
        wait(31).await;

        assert!(!registry.is_active(C1).await);
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(
            mirror.calls(),
            vec![MirrorCall::Upsert(C1, 1), MirrorCall::Inactive(C1)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn channels_are_independent() {
        let (registry, _, _) = fixtures();
        registry.start_round(C1, question(1, "Paris")).await.unwrap();
        registry.start_round(C2, question(2, "Oxygen")).await.unwrap();

        registry.submit_answer(C1, "paris", alice()).await.unwrap();

        assert!(!registry.is_active(C1).await);
        assert!(registry.is_active(C2).await);
        assert_eq!(registry.active_rounds().await, 1);

        // A correct answer for C1 means nothing in C2.
        let result = registry.submit_answer(C2, "paris", alice()).await.unwrap();
        assert!(matches!(result, Submission::Incorrect));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_starts_leave_one_round() {
        let (registry, mirror, _) = fixtures();

        let starts = (1..=10).map(|id| registry.start_round(C1, question(id, "Paris")));
        let results = join_all(starts).await;

        let started = results.iter().filter(|r| r.is_ok()).count();
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(GameError::AlreadyActive)))
            .count();
        assert_eq!(started, 1);
        assert_eq!(rejected, 9);
        assert_eq!(registry.active_rounds().await, 1);
        assert_eq!(mirror.calls().len(), 1);
    }
}
