//! One-second tick source.
//!
//! A `Ticker` owns at most one spawned interval task. Every tick it sends is
//! tagged with the id of the task that produced it; `start` aborts the
//! previous task and issues a fresh id, so a tick already sitting in the
//! channel from an older task can be recognised as stale by the receiver.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Id of the ticker task that produced a tick.
pub type TickId = u64;

#[derive(Debug)]
pub struct Ticker {
    handle: Option<JoinHandle<()>>,
    current: TickId,
    interval: Duration,
}

impl Ticker {
    pub fn new() -> Self {
        Self::with_interval(TICK_INTERVAL)
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            handle: None,
            current: 0,
            interval,
        }
    }

    /// Spawn a fresh tick task, cancelling any running one first.
    ///
    /// The first tick arrives one full interval after this call. `make`
    /// turns the tick id into whatever message the receiver expects.
    pub fn start<M, F>(&mut self, tx: UnboundedSender<M>, make: F) -> TickId
    where
        M: Send + 'static,
        F: Fn(TickId) -> M + Send + 'static,
    {
        self.cancel();
        self.current = self.current.wrapping_add(1);
        let id = self.current;
        let period = self.interval;

        self.handle = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send(make(id)).is_err() {
                    break;
                }
            }
        }));
        tracing::trace!(tick_id = id, "ticker started");
        id
    }

    /// Stop the tick task. Ticks it already queued become stale.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            // Ticks queued before the abort must not count either.
            self.current = self.current.wrapping_add(1);
            tracing::trace!("ticker cancelled");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Whether a tick with this id comes from the live task.
    pub fn is_current(&self, id: TickId) -> bool {
        self.handle.is_some() && id == self.current
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.cancel();
    }
}
