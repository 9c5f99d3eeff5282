//! Best-effort user notifications and sound.
//!
//! Neither is required for the engine to work: callers log failures and
//! carry on.

use crate::error::NotifyError;
use crate::timer::Mode;

pub trait Notifier: Send + Sync {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Drops every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _title: &str, _body: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

pub trait AudioPlayer: Send + Sync {
    /// Short one-shot effect played on completion.
    fn play_effect(&self);
    /// Looping background track. `volume` is 0.0 ..= 1.0.
    fn start_music(&self, volume: f32);
    fn stop_music(&self);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioPlayer for NullAudio {
    fn play_effect(&self) {}
    fn start_music(&self, _volume: f32) {}
    fn stop_music(&self) {}
}

/// Title and body of the completion notification for `mode`.
pub fn completion_message(mode: Mode) -> (&'static str, &'static str) {
    match mode {
        Mode::Focus => ("Focus complete!", "Your tree bore fruit. Time for a break."),
        Mode::ShortBreak | Mode::LongBreak => ("Break over!", "Ready to grow another tree?"),
    }
}

/// Shown in hard mode when the user drifts away from a focus session.
pub fn distraction_message(count: u32) -> (&'static str, String) {
    let body = if count == 1 {
        "You left during a focus session. Your tree is waiting!".to_string()
    } else {
        format!("That's {count} distractions this session. Stay with your tree!")
    };
    ("Stay focused!", body)
}
