//! The session driver.
//!
//! One tokio task owns the [`SessionClock`], its [`Ticker`], the pending
//! auto-advance and everything asynchronous that reports back. Callers talk
//! to it through a [`SessionHandle`] and read [`Event`]s from the returned
//! receiver.
//!
//! Late results are tagged: ticks with the ticker id, auto-advance with the
//! clock generation, reward and break-activity results with the runner's
//! content epoch. Reset and mode switch move the epoch on, so anything still
//! in flight for the discarded session is dropped on arrival.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use super::clock::{SessionClock, SessionSummary, TimerState};
use super::mode::Mode;
use super::ticker::{TickId, Ticker};
use crate::completion::{CompletionHandler, CompletionOutcome};
use crate::content::BreakActivity;
use crate::error::SessionClosed;
use crate::events::Event;
use crate::notify::distraction_message;
use crate::storage::Config;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Pause,
    Reset,
    SwitchMode(Mode),
    SetSubject(String),
    /// The user left the app during a session.
    Distraction,
    /// Emit a `StateSnapshot`.
    Snapshot,
    /// New settings; durations apply from the next idle countdown.
    UpdateSettings(Box<Config>),
    Shutdown,
}

enum Internal {
    Tick(TickId),
    Completed {
        epoch: u64,
        outcome: CompletionOutcome,
    },
    Activity {
        epoch: u64,
        activity: BreakActivity,
    },
    AutoAdvance {
        generation: u64,
        mode: Mode,
    },
}

/// Builder for a session task.
pub struct SessionRunner {
    clock: SessionClock,
    settings: Config,
    handler: Arc<CompletionHandler>,
    tick_interval: Duration,
}

impl SessionRunner {
    pub fn new(settings: Config, handler: Arc<CompletionHandler>) -> Self {
        Self {
            clock: SessionClock::new(settings.durations(), Mode::Focus),
            settings,
            handler,
            tick_interval: super::ticker::TICK_INTERVAL,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.clock = SessionClock::new(self.settings.durations(), mode);
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.clock.set_subject(subject);
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    /// Spawn the session task on the current runtime.
    pub fn spawn(self) -> (SessionHandle, UnboundedReceiver<Event>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();

        let state = RunnerState {
            clock: self.clock,
            settings: self.settings,
            handler: self.handler,
            ticker: Ticker::with_interval(self.tick_interval),
            auto_advance: None,
            completions: Vec::new(),
            epoch: 0,
            events: event_tx,
            internal: internal_tx,
        };
        let task = tokio::spawn(run(state, command_rx, internal_rx));

        (
            SessionHandle {
                commands: command_tx,
                task: Some(task),
            },
            event_rx,
        )
    }
}

/// Sends commands to a running session task.
#[derive(Debug)]
pub struct SessionHandle {
    commands: UnboundedSender<Command>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn send(&self, command: Command) -> Result<(), SessionClosed> {
        self.commands.send(command).map_err(|_| SessionClosed)
    }

    pub fn start(&self) -> Result<(), SessionClosed> {
        self.send(Command::Start)
    }

    pub fn pause(&self) -> Result<(), SessionClosed> {
        self.send(Command::Pause)
    }

    pub fn reset(&self) -> Result<(), SessionClosed> {
        self.send(Command::Reset)
    }

    pub fn switch_mode(&self, mode: Mode) -> Result<(), SessionClosed> {
        self.send(Command::SwitchMode(mode))
    }

    pub fn set_subject(&self, subject: impl Into<String>) -> Result<(), SessionClosed> {
        self.send(Command::SetSubject(subject.into()))
    }

    pub fn distraction(&self) -> Result<(), SessionClosed> {
        self.send(Command::Distraction)
    }

    pub fn snapshot(&self) -> Result<(), SessionClosed> {
        self.send(Command::Snapshot)
    }

    pub fn update_settings(&self, settings: Config) -> Result<(), SessionClosed> {
        self.send(Command::UpdateSettings(Box::new(settings)))
    }

    /// Stop the task and wait for it to finish.
    pub async fn shutdown(mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "session task ended abnormally");
            }
        }
    }
}

struct RunnerState {
    clock: SessionClock,
    settings: Config,
    handler: Arc<CompletionHandler>,
    ticker: Ticker,
    auto_advance: Option<JoinHandle<()>>,
    /// Completion sequences still running; shutdown waits for them.
    completions: Vec<JoinHandle<()>>,
    /// Moves on whenever the user throws the current session away.
    epoch: u64,
    events: UnboundedSender<Event>,
    internal: UnboundedSender<Internal>,
}

async fn run(
    mut state: RunnerState,
    mut commands: UnboundedReceiver<Command>,
    mut internal: UnboundedReceiver<Internal>,
) {
    tracing::debug!(mode = %state.clock.mode(), "session task started");
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Shutdown) | None => break,
                Some(command) => state.on_command(command),
            },
            Some(message) = internal.recv() => state.on_internal(message),
        }
    }
    state.stop().await;
    tracing::debug!("session task stopped");
}

impl RunnerState {
    fn emit(&self, event: Event) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }

    fn on_command(&mut self, command: Command) {
        match command {
            Command::Start => self.start(),
            Command::Pause => {
                if let Some(event) = self.clock.pause() {
                    self.ticker.cancel();
                    self.handler.audio().stop_music();
                    self.emit(event);
                }
            }
            Command::Reset => {
                self.discard_pending();
                let event = self.clock.reset();
                self.finish_discard(event);
            }
            Command::SwitchMode(mode) => {
                self.discard_pending();
                let event = self.clock.switch_mode(mode);
                self.finish_discard(event);
            }
            Command::SetSubject(subject) => {
                if !self.clock.set_subject(subject) {
                    tracing::debug!(state = ?self.clock.state(), "subject change ignored");
                }
            }
            Command::Distraction => self.distraction(),
            Command::Snapshot => self.emit(self.clock.snapshot()),
            Command::UpdateSettings(settings) => {
                self.clock.set_durations(settings.durations());
                self.settings = *settings;
            }
            Command::Shutdown => {}
        }
    }

    fn on_internal(&mut self, message: Internal) {
        match message {
            Internal::Tick(id) => {
                if !self.ticker.is_current(id) {
                    tracing::trace!(tick_id = id, "stale tick dropped");
                    return;
                }
                match self.clock.tick() {
                    Some(Event::SessionCompleted { session }) => self.complete(session),
                    Some(event) => self.emit(event),
                    None => {}
                }
            }
            Internal::Completed { epoch, outcome } => {
                let CompletionOutcome {
                    reward, activity, ..
                } = outcome;
                if epoch != self.epoch {
                    tracing::debug!("completion result for a discarded session dropped");
                    return;
                }
                if let Some(reward) = reward {
                    self.emit(Event::RewardEarned { reward });
                }
                if let Some(activity) = activity {
                    let internal = self.internal.clone();
                    tokio::spawn(async move {
                        let activity = activity.await.unwrap_or_else(|e| {
                            tracing::warn!(error = %e, "break activity task failed");
                            BreakActivity::fallback()
                        });
                        let _ = internal.send(Internal::Activity { epoch, activity });
                    });
                }
            }
            Internal::Activity { epoch, activity } => {
                if epoch == self.epoch {
                    self.emit(Event::BreakActivityReady { activity });
                } else {
                    tracing::debug!("break activity for a discarded session dropped");
                }
            }
            Internal::AutoAdvance { generation, mode } => {
                self.auto_advance = None;
                if generation != self.clock.generation()
                    || self.clock.state() != TimerState::Completed
                {
                    tracing::debug!("stale auto-advance dropped");
                    return;
                }
                if let Some(event) = self.clock.switch_mode(mode) {
                    tracing::info!(mode = %mode, "auto-advanced");
                    self.emit(event);
                }
            }
        }
    }

    fn start(&mut self) {
        let Some(event) = self.clock.start() else {
            tracing::debug!(state = ?self.clock.state(), "start ignored");
            return;
        };
        self.cancel_auto_advance();
        self.ticker.start(self.internal.clone(), Internal::Tick);
        let sound = &self.settings.sound;
        if self.clock.mode().is_focus() && sound.music_enabled {
            self.handler.audio().start_music(sound.music_volume);
        }
        self.emit(event);
    }

    fn distraction(&mut self) {
        if !self.settings.timer.hard_mode {
            return;
        }
        if let Some(event) = self.clock.record_distraction() {
            let (title, body) = distraction_message(self.clock.distraction_count());
            self.handler.notify(title, &body);
            self.emit(event);
        }
    }

    fn complete(&mut self, session: SessionSummary) {
        self.ticker.cancel();
        self.emit(Event::SessionCompleted {
            session: session.clone(),
        });

        let handler = Arc::clone(&self.handler);
        let internal = self.internal.clone();
        let sound = self.settings.sound.clone();
        let epoch = self.epoch;
        let summary = session.clone();
        self.completions.retain(|task| !task.is_finished());
        self.completions.push(tokio::spawn(async move {
            let outcome = handler.handle(&summary, &sound).await;
            let _ = internal.send(Internal::Completed { epoch, outcome });
        }));

        let timer = &self.settings.timer;
        let advance = if session.mode.is_focus() {
            timer.auto_start_breaks
        } else {
            timer.auto_start_pomodoros
        };
        if advance {
            let next = self.clock.next_mode(timer.long_break_interval);
            self.schedule_auto_advance(next);
        }
    }

    fn schedule_auto_advance(&mut self, mode: Mode) {
        self.cancel_auto_advance();
        let delay_secs = self.settings.timer.auto_advance_delay_secs;
        let generation = self.clock.generation();
        let internal = self.internal.clone();
        self.auto_advance = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(delay_secs)).await;
            let _ = internal.send(Internal::AutoAdvance { generation, mode });
        }));
        self.emit(Event::AutoAdvanceScheduled { mode, delay_secs });
    }

    fn cancel_auto_advance(&mut self) {
        if let Some(handle) = self.auto_advance.take() {
            handle.abort();
            tracing::debug!("auto-advance cancelled");
        }
    }

    /// Stop everything tied to the current session before reset/switch.
    fn discard_pending(&mut self) {
        self.ticker.cancel();
        self.cancel_auto_advance();
        self.handler.audio().stop_music();
        self.epoch = self.epoch.wrapping_add(1);
    }

    fn finish_discard(&mut self, event: Option<Event>) {
        let Some(event) = event else { return };
        let abandoned = match &event {
            Event::SessionReset { abandoned, .. } | Event::ModeSwitched { abandoned, .. } => {
                abandoned.as_ref()
            }
            _ => None,
        };
        if let Some(summary) = abandoned {
            // Inline write: the log is stored before the event goes out.
            self.handler.record_abandoned(summary);
        }
        self.emit(event);
    }

    async fn stop(&mut self) {
        self.ticker.cancel();
        self.cancel_auto_advance();
        self.handler.audio().stop_music();
        for task in self.completions.drain(..) {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "completion task ended abnormally");
            }
        }
    }
}
