use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;
use focusforest_core::error::NotifyError;
use focusforest_core::{
    AudioPlayer, CompletionHandler, ContentService, Event, GeminiClient, Mode, Notifier,
    OfflineContent, Persistence, SessionHandle, SessionRunner,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{format_clock, open_store};

const HELP: &str = "keys: s start/resume, p pause, r reset, d distraction, \
                    f focus, b short break, l long break, i status, q quit";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a live session, controlled from stdin
    Run {
        /// focus, short-break or long-break
        #[arg(long, default_value = "focus")]
        mode: Mode,
        /// What you are working on
        #[arg(long, default_value = "")]
        subject: String,
        /// Skip the content service and use built-in facts and activities
        #[arg(long)]
        offline: bool,
    },
}

/// Prints notifications inline.
struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        println!("🔔 {title} {body}");
        Ok(())
    }
}

/// Terminal bell for the completion effect. No background music in a terminal.
struct TerminalBell;

impl AudioPlayer for TerminalBell {
    fn play_effect(&self) {
        print!("\x07");
        let _ = std::io::stdout().flush();
    }

    fn start_music(&self, volume: f32) {
        tracing::debug!(volume, "background music not supported in the terminal");
    }

    fn stop_music(&self) {}
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Run {
            mode,
            subject,
            offline,
        } => {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(run_live(mode, subject, offline))
        }
    }
}

fn content_service(offline: bool, store: &dyn Persistence) -> Arc<dyn ContentService> {
    if offline {
        return Arc::new(OfflineContent);
    }
    match GeminiClient::from_config(&store.settings().content) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::info!(error = %e, "content service unavailable, using built-in content");
            Arc::new(OfflineContent)
        }
    }
}

async fn run_live(
    mode: Mode,
    subject: String,
    offline: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(open_store()?);
    let settings = store.settings();
    let content = content_service(offline, store.as_ref());

    let handler = CompletionHandler::new(store.clone(), content)
        .with_notifier(Arc::new(StdoutNotifier))
        .with_audio(Arc::new(TerminalBell))
        .with_content_timeout(Duration::from_secs(settings.content.timeout_secs.max(1)));
    let (handle, mut events) = SessionRunner::new(settings, Arc::new(handler))
        .with_mode(mode)
        .with_subject(subject)
        .spawn();

    println!("{HELP}");
    handle.snapshot()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !dispatch(&handle, line.trim())? {
                    break;
                }
            }
            Some(event) = events.recv() => render(&event),
        }
    }

    handle.shutdown().await;
    // The runner has exited; print whatever it emitted before quitting.
    while let Some(event) = events.recv().await {
        render(&event);
    }
    Ok(())
}

/// Returns false on quit.
fn dispatch(handle: &SessionHandle, key: &str) -> Result<bool, Box<dyn std::error::Error>> {
    match key {
        "s" => handle.start()?,
        "p" => handle.pause()?,
        "r" => handle.reset()?,
        "d" => handle.distraction()?,
        "f" => handle.switch_mode(Mode::Focus)?,
        "b" => handle.switch_mode(Mode::ShortBreak)?,
        "l" => handle.switch_mode(Mode::LongBreak)?,
        "i" => handle.snapshot()?,
        "q" => return Ok(false),
        "" => {}
        _ => println!("{HELP}"),
    }
    Ok(true)
}

fn render(event: &Event) {
    match event {
        Event::SessionStarted {
            mode,
            duration_secs,
            subject,
            ..
        } => {
            let about = if subject.is_empty() {
                String::new()
            } else {
                format!(" on {subject}")
            };
            println!("▶ {} started{about} ({})", mode.label(), format_clock(*duration_secs));
        }
        Event::SessionPaused { remaining_secs, .. } => {
            println!("⏸ paused at {}", format_clock(*remaining_secs));
        }
        Event::SessionResumed { remaining_secs, .. } => {
            println!("▶ resumed at {}", format_clock(*remaining_secs));
        }
        Event::Tick {
            remaining_secs,
            stage,
            ..
        } => {
            println!("{}  {} {}", format_clock(*remaining_secs), stage.emoji(), stage.as_str());
        }
        Event::SessionCompleted { session } => {
            println!("✔ {} complete", session.mode.label());
        }
        Event::SessionReset { mode, .. } => {
            println!("↺ reset to {}", mode.label());
        }
        Event::ModeSwitched {
            mode,
            duration_secs,
            ..
        } => {
            println!("→ {} ({})", mode.label(), format_clock(*duration_secs));
        }
        Event::DistractionRecorded { count, .. } => {
            println!("⚠ distraction #{count}");
        }
        Event::RewardEarned { reward } => {
            println!(
                "{} You grew {} {}! {}",
                reward.kind.emoji(),
                article(reward.kind.name()),
                reward.kind.name(),
                reward.fact.as_deref().unwrap_or(""),
            );
        }
        Event::BreakActivityReady { activity } => {
            println!(
                "{} Break idea: {} - {}",
                activity.emoji, activity.title, activity.description
            );
        }
        Event::AutoAdvanceScheduled { mode, delay_secs } => {
            println!("Switching to {} in {delay_secs}s", mode.label());
        }
        Event::StateSnapshot {
            state,
            mode,
            remaining_secs,
            stage,
            distraction_count,
            ..
        } => {
            println!(
                "{} {:?} {}  {} {}  distractions: {distraction_count}",
                mode.label(),
                state,
                format_clock(*remaining_secs),
                stage.emoji(),
                stage.as_str(),
            );
        }
    }
}

fn article(word: &str) -> &'static str {
    match word.chars().next() {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}
