//! Integration tests for a full focus/break cycle against the on-disk store.
//!
//! These tests drive the session runner on a paused tokio clock and check
//! what ends up in the database, the garden and the stats.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use focusforest_core::garden::{self, TreeKind, FRUIT_SELL_PRICE};
use focusforest_core::{
    CompletionHandler, Config, Event, LocalStore, Mode, OfflineContent, Persistence, SessionRunner,
    Stats,
};
use tokio::sync::mpsc::UnboundedReceiver;

async fn wait_for<F: Fn(&Event) -> bool>(events: &mut UnboundedReceiver<Event>, pred: F) -> Event {
    loop {
        let event = events.recv().await.unwrap();
        if pred(&event) {
            return event;
        }
    }
}

fn one_minute_cycle() -> Config {
    let mut config = Config::default();
    config.timer.focus_duration = 1;
    config.timer.short_break = 1;
    config.timer.auto_start_breaks = true;
    config.timer.auto_start_pomodoros = true;
    config.timer.auto_advance_delay_secs = 2;
    config
}

#[tokio::test(start_paused = true)]
async fn test_focus_then_break_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalStore::open_in(dir.path()).unwrap());
    let config = one_minute_cycle();
    store.save_settings(&config).unwrap();

    let handler = CompletionHandler::new(store.clone(), Arc::new(OfflineContent)).with_seed(3);
    let (handle, mut events) = SessionRunner::new(store.settings(), Arc::new(handler))
        .with_subject("Physics")
        .spawn();

    // Focus session grows a fruit, then the runner moves to a short break.
    handle.start().unwrap();
    wait_for(&mut events, |e| matches!(e, Event::RewardEarned { .. })).await;
    let switched = wait_for(&mut events, |e| matches!(e, Event::ModeSwitched { .. })).await;
    assert!(matches!(
        switched,
        Event::ModeSwitched {
            mode: Mode::ShortBreak,
            ..
        }
    ));

    // Break completes and hands back to focus.
    handle.start().unwrap();
    let switched = wait_for(&mut events, |e| matches!(e, Event::ModeSwitched { .. })).await;
    assert!(matches!(
        switched,
        Event::ModeSwitched {
            mode: Mode::Focus,
            ..
        }
    ));
    handle.shutdown().await;

    let logs = store.logs();
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].mode, Mode::Focus);
    assert_eq!(logs[0].subject, "Physics");
    assert_eq!(logs[1].mode, Mode::ShortBreak);
    assert!(logs.iter().all(|l| l.completed));

    let rewards = store.rewards();
    assert_eq!(rewards.len(), 1);
    assert_eq!(rewards[0].subject, "Physics");

    let stats = Stats::from_logs(&logs, &Utc::now());
    assert_eq!(stats.total_sessions, 1);
    assert_eq!(stats.total_focus_minutes, 1);
    assert_eq!(stats.completion_rate, 100);
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_session_lowers_completion_rate() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(LocalStore::open_in(dir.path()).unwrap());
    let handler = CompletionHandler::new(store.clone(), Arc::new(OfflineContent));
    let (handle, mut events) = SessionRunner::new(one_minute_cycle(), Arc::new(handler)).spawn();

    handle.start().unwrap();
    wait_for(&mut events, |e| matches!(e, Event::RewardEarned { .. })).await;

    // Second focus started, then thrown away after 30 seconds.
    wait_for(&mut events, |e| matches!(e, Event::ModeSwitched { .. })).await;
    handle.switch_mode(Mode::Focus).unwrap();
    handle.start().unwrap();
    tokio::time::sleep(Duration::from_millis(30_500)).await;
    handle.reset().unwrap();
    wait_for(&mut events, |e| matches!(e, Event::SessionReset { .. })).await;
    handle.shutdown().await;

    let logs = store.logs();
    assert_eq!(logs.len(), 2);
    assert!(!logs[1].completed);
    assert_eq!(logs[1].duration_minutes, 0);
    assert_eq!(Stats::from_logs(&logs, &Utc::now()).completion_rate, 50);
}

#[test]
fn test_garden_economy_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::open_in(dir.path()).unwrap();
    store.save_seeds(45).unwrap();
    store
        .save_reward(&focusforest_core::Reward::new(
            focusforest_core::FruitKind::Cherry,
            "Art",
            "Cherries!",
        ))
        .unwrap();

    let id = store.rewards()[0].id.clone();
    let (_, balance) = garden::sell_fruit(&store, &id).unwrap();
    assert_eq!(balance, 45 + FRUIT_SELL_PRICE);

    assert_eq!(garden::unlock_tree(&store, TreeKind::Pine).unwrap(), 5);

    let reopened = LocalStore::open_in(dir.path()).unwrap();
    let summary = garden::summary(&reopened);
    assert_eq!(summary.seeds, 5);
    assert_eq!(summary.total_fruit, 0);
    assert_eq!(summary.unlocked_trees, vec![TreeKind::Oak, TreeKind::Pine]);
}
