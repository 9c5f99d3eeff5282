//! Side effects fired once when a countdown reaches zero.
//!
//! Order: session log, notification, sound, then (focus only) fruit pick,
//! fact lookup and reward. The break-activity lookup is spawned before the
//! fact is awaited and runs on its own; the caller receives its handle.
//!
//! Every collaborator failure is logged and replaced by a fallback. Nothing
//! in here can fail the completion.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::SeedableRng;
use rand_pcg::Pcg64;
use tokio::task::JoinHandle;

use crate::content::{
    break_activity_or_fallback, fruit_fact_or_fallback, BreakActivity, ContentService,
    DEFAULT_TIMEOUT,
};
use crate::error::StorageError;
use crate::notify::{completion_message, AudioPlayer, Notifier, NullAudio, NullNotifier};
use crate::reward::{FruitKind, Reward};
use crate::storage::config::SoundConfig;
use crate::storage::{Persistence, SessionLog};
use crate::timer::SessionSummary;

/// What one completion produced.
#[derive(Debug)]
pub struct CompletionOutcome {
    pub log: SessionLog,
    /// Present for focus sessions only.
    pub reward: Option<Reward>,
    /// Pending break-activity lookup. Focus sessions only.
    pub activity: Option<JoinHandle<BreakActivity>>,
}

pub struct CompletionHandler {
    store: Arc<dyn Persistence>,
    content: Arc<dyn ContentService>,
    notifier: Arc<dyn Notifier>,
    audio: Arc<dyn AudioPlayer>,
    content_timeout: Duration,
    rng: Mutex<Pcg64>,
}

impl CompletionHandler {
    pub fn new(store: Arc<dyn Persistence>, content: Arc<dyn ContentService>) -> Self {
        Self {
            store,
            content,
            notifier: Arc::new(NullNotifier),
            audio: Arc::new(NullAudio),
            content_timeout: DEFAULT_TIMEOUT,
            rng: Mutex::new(Pcg64::from_entropy()),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_audio(mut self, audio: Arc<dyn AudioPlayer>) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_content_timeout(mut self, timeout: Duration) -> Self {
        self.content_timeout = timeout;
        self
    }

    /// Pin the fruit sequence.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(Pcg64::seed_from_u64(seed));
        self
    }

    pub fn store(&self) -> &Arc<dyn Persistence> {
        &self.store
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    pub fn audio(&self) -> &dyn AudioPlayer {
        self.audio.as_ref()
    }

    /// Best-effort notification; failures are logged and dropped.
    pub fn notify(&self, title: &str, body: &str) {
        if let Err(e) = self.notifier.notify(title, body) {
            tracing::debug!(error = %e, "notification not delivered");
        }
    }

    /// Run the completion sequence for a session that reached zero.
    pub async fn handle(&self, session: &SessionSummary, sound: &SoundConfig) -> CompletionOutcome {
        let log = SessionLog::from_summary(session);
        let saved = log.clone();
        self.persist("session log", move |store| store.save_log(&saved)).await;

        let (title, body) = completion_message(session.mode);
        self.notify(title, body);

        if sound.sound_enabled {
            self.audio.play_effect();
        }
        self.audio.stop_music();

        if !session.mode.is_focus() {
            return CompletionOutcome {
                log,
                reward: None,
                activity: None,
            };
        }

        let fruit = self.pick_fruit();

        let activity = {
            let content = Arc::clone(&self.content);
            let subject = session.subject.clone();
            let timeout = self.content_timeout;
            tokio::spawn(async move {
                break_activity_or_fallback(content.as_ref(), &subject, timeout).await
            })
        };

        let fact = fruit_fact_or_fallback(self.content.as_ref(), fruit, self.content_timeout).await;
        let reward = Reward::new(fruit, session.subject.clone(), fact);
        let saved = reward.clone();
        self.persist("reward", move |store| store.save_reward(&saved)).await;
        tracing::info!(fruit = %fruit, subject = %reward.subject, "reward earned");

        CompletionOutcome {
            log,
            reward: Some(reward),
            activity: Some(activity),
        }
    }

    /// Log a session that was started and then thrown away.
    pub fn record_abandoned(&self, session: &SessionSummary) -> SessionLog {
        let log = SessionLog::from_summary(session);
        if let Err(e) = self.store.save_log(&log) {
            tracing::warn!(error = %e, "failed to save abandoned session log");
        }
        log
    }

    /// Run a store write on the blocking pool.
    async fn persist<F>(&self, what: &'static str, write: F)
    where
        F: FnOnce(&dyn Persistence) -> Result<(), StorageError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        match tokio::task::spawn_blocking(move || write(store.as_ref())).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "failed to save {what}"),
            Err(e) => tracing::warn!(error = %e, "{what} write task failed"),
        }
    }

    fn pick_fruit(&self) -> FruitKind {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        FruitKind::pick(&mut *rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{OfflineContent, FALLBACK_FACT};
    use crate::error::{ContentError, NotifyError};
    use crate::storage::MemoryStore;
    use crate::timer::Mode;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Broken;

    #[async_trait]
    impl ContentService for Broken {
        async fn fruit_fact(&self, _fruit: FruitKind) -> Result<String, ContentError> {
            Err(ContentError::Status {
                status: 503,
                body: "overloaded".into(),
            })
        }

        async fn break_activity(&self, _subject: &str) -> Result<BreakActivity, ContentError> {
            Err(ContentError::MissingApiKey)
        }
    }

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<String>>,
    }

    impl Notifier for Recorder {
        fn notify(&self, title: &str, _body: &str) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(title.to_string());
            Err(NotifyError::PermissionDenied)
        }
    }

    #[derive(Default)]
    struct Counter {
        effects: AtomicUsize,
        stops: AtomicUsize,
    }

    impl AudioPlayer for Counter {
        fn play_effect(&self) {
            self.effects.fetch_add(1, Ordering::SeqCst);
        }
        fn start_music(&self, _volume: f32) {}
        fn stop_music(&self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn summary(mode: Mode, completed: bool) -> SessionSummary {
        SessionSummary {
            mode,
            duration_secs: 1500,
            remaining_secs: if completed { 0 } else { 600 },
            subject: "Math".into(),
            distraction_count: 2,
            started_at: Utc::now(),
            ended_at: Utc::now(),
            completed,
        }
    }

    #[tokio::test]
    async fn focus_completion_logs_then_rewards() {
        let store = Arc::new(MemoryStore::new());
        let handler = CompletionHandler::new(store.clone(), Arc::new(OfflineContent)).with_seed(7);

        let outcome = handler
            .handle(&summary(Mode::Focus, true), &SoundConfig::default())
            .await;

        let logs = store.logs();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].completed);
        assert_eq!(logs[0].duration_minutes, 25);
        assert_eq!(logs[0].distractions, 2);

        let reward = outcome.reward.unwrap();
        assert!(FruitKind::ALL.contains(&reward.kind));
        assert_eq!(reward.subject, "Math");
        assert_eq!(store.rewards(), vec![reward]);

        let activity = outcome.activity.unwrap().await.unwrap();
        assert_eq!(activity, BreakActivity::fallback());
    }

    #[tokio::test]
    async fn content_failure_still_rewards() {
        let store = Arc::new(MemoryStore::new());
        let handler = CompletionHandler::new(store.clone(), Arc::new(Broken));
        let outcome = handler
            .handle(&summary(Mode::Focus, true), &SoundConfig::default())
            .await;
        assert_eq!(outcome.reward.unwrap().fact.as_deref(), Some(FALLBACK_FACT));
        assert_eq!(store.rewards().len(), 1);
    }

    #[tokio::test]
    async fn break_completion_has_no_reward() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(Recorder::default());
        let handler = CompletionHandler::new(store.clone(), Arc::new(OfflineContent))
            .with_notifier(notifier.clone());

        let outcome = handler
            .handle(&summary(Mode::ShortBreak, true), &SoundConfig::default())
            .await;
        assert!(outcome.reward.is_none());
        assert!(outcome.activity.is_none());
        assert_eq!(store.logs().len(), 1);
        assert!(store.rewards().is_empty());
        // Delivery failed, completion carried on.
        assert_eq!(*notifier.sent.lock().unwrap(), vec!["Break over!".to_string()]);
    }

    #[tokio::test]
    async fn sound_flag_gates_effect() {
        let audio = Arc::new(Counter::default());
        let handler = CompletionHandler::new(Arc::new(MemoryStore::new()), Arc::new(OfflineContent))
            .with_audio(audio.clone());
        let quiet = SoundConfig {
            sound_enabled: false,
            ..SoundConfig::default()
        };

        handler.handle(&summary(Mode::LongBreak, true), &quiet).await;
        assert_eq!(audio.effects.load(Ordering::SeqCst), 0);
        handler
            .handle(&summary(Mode::LongBreak, true), &SoundConfig::default())
            .await;
        assert_eq!(audio.effects.load(Ordering::SeqCst), 1);
        assert_eq!(audio.stops.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn same_seed_same_fruit() {
        let pick = |seed| {
            CompletionHandler::new(Arc::new(MemoryStore::new()), Arc::new(OfflineContent))
                .with_seed(seed)
                .pick_fruit()
        };
        assert_eq!(pick(42), pick(42));
    }

    #[test]
    fn abandoned_sessions_log_incomplete() {
        let store = Arc::new(MemoryStore::new());
        let handler = CompletionHandler::new(store.clone(), Arc::new(OfflineContent));
        let log = handler.record_abandoned(&summary(Mode::Focus, false));
        assert!(!log.completed);
        assert_eq!(log.duration_minutes, 15);
        assert_eq!(store.logs(), vec![log]);
    }
}
