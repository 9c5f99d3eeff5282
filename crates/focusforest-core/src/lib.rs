//! # FocusForest Core Library
//!
//! Core logic for the FocusForest focus timer: a Pomodoro-style countdown
//! that grows a tree while you work, pays out a fruit for every finished
//! focus session and lets you spend the proceeds on new tree variants.
//!
//! The `focusforest` CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Session Clock**: whole-second state machine; the caller ticks it
//! - **Session Runner**: tokio task owning the clock, its ticker and the
//!   auto-advance timer; talks in [`Command`]s and [`Event`]s
//! - **Completion Handler**: the one-shot log / notify / reward sequence
//! - **Storage**: SQLite history plus TOML settings behind [`Persistence`]
//! - **Content**: fruit facts and break activities from Gemini, with local
//!   fallbacks
//!
//! ## Key Components
//!
//! - [`SessionClock`]: countdown state machine
//! - [`SessionRunner`]: async driver
//! - [`CompletionHandler`]: completion side effects
//! - [`LocalStore`]: on-disk persistence
//! - [`Config`]: application configuration

pub mod completion;
pub mod content;
pub mod error;
pub mod events;
pub mod garden;
pub mod notify;
pub mod reward;
pub mod stats;
pub mod storage;
pub mod tasks;
pub mod timer;

pub use completion::{CompletionHandler, CompletionOutcome};
pub use content::{BreakActivity, ContentService, GeminiClient, OfflineContent};
pub use error::{
    ConfigError, ContentError, CoreError, GardenError, NotifyError, SessionClosed, StorageError,
    TaskError,
};
pub use events::Event;
pub use garden::{GardenSummary, TreeKind};
pub use notify::{AudioPlayer, Notifier, NullAudio, NullNotifier};
pub use reward::{FruitKind, Reward};
pub use stats::{Stats, TimeOfDay};
pub use storage::{Config, Database, LocalStore, MemoryStore, Persistence, SessionLog};
pub use tasks::{Priority, Task};
pub use timer::{
    derive_stage, Command, Mode, ModeDurations, SessionClock, SessionHandle, SessionRunner,
    SessionSummary, Stage, TimerState,
};
