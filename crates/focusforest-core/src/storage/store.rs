//! The persistence collaborator.
//!
//! Reads never fail: missing or unreadable data yields the documented
//! default. Writes return a `Result`, which the engine logs and otherwise
//! ignores.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::config::Config;
use super::data_dir;
use super::database::{Database, SessionLog};
use crate::error::StorageError;
use crate::garden::{default_unlocked, TreeKind};
use crate::reward::Reward;
use crate::tasks::Task;

const KEY_TASKS: &str = "tasks";
const KEY_SEEDS: &str = "seeds";
const KEY_UNLOCKED_TREES: &str = "unlocked_trees";

pub trait Persistence: Send + Sync {
    fn save_log(&self, log: &SessionLog) -> Result<(), StorageError>;
    fn logs(&self) -> Vec<SessionLog>;

    fn save_reward(&self, reward: &Reward) -> Result<(), StorageError>;
    fn rewards(&self) -> Vec<Reward>;
    fn save_rewards(&self, rewards: &[Reward]) -> Result<(), StorageError>;

    fn settings(&self) -> Config;
    fn save_settings(&self, settings: &Config) -> Result<(), StorageError>;

    fn tasks(&self) -> Vec<Task>;
    fn save_tasks(&self, tasks: &[Task]) -> Result<(), StorageError>;

    fn seeds(&self) -> u64;
    fn save_seeds(&self, seeds: u64) -> Result<(), StorageError>;

    fn unlocked_trees(&self) -> Vec<TreeKind>;
    fn save_unlocked_trees(&self, trees: &[TreeKind]) -> Result<(), StorageError>;

    /// Forget everything, settings included.
    fn clear_all(&self) -> Result<(), StorageError>;
}

// ── In-memory ────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct MemoryState {
    logs: Vec<SessionLog>,
    rewards: Vec<Reward>,
    settings: Option<Config>,
    tasks: Vec<Task>,
    seeds: u64,
    unlocked_trees: Option<Vec<TreeKind>>,
}

/// Process-local store, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: Config) -> Self {
        let store = Self::new();
        store.lock().settings = Some(settings);
        store
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // A panic while holding the lock cannot leave the plain data inconsistent.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Persistence for MemoryStore {
    fn save_log(&self, log: &SessionLog) -> Result<(), StorageError> {
        self.lock().logs.push(log.clone());
        Ok(())
    }

    fn logs(&self) -> Vec<SessionLog> {
        self.lock().logs.clone()
    }

    fn save_reward(&self, reward: &Reward) -> Result<(), StorageError> {
        self.lock().rewards.push(reward.clone());
        Ok(())
    }

    fn rewards(&self) -> Vec<Reward> {
        self.lock().rewards.clone()
    }

    fn save_rewards(&self, rewards: &[Reward]) -> Result<(), StorageError> {
        self.lock().rewards = rewards.to_vec();
        Ok(())
    }

    fn settings(&self) -> Config {
        self.lock().settings.clone().unwrap_or_default()
    }

    fn save_settings(&self, settings: &Config) -> Result<(), StorageError> {
        self.lock().settings = Some(settings.clone());
        Ok(())
    }

    fn tasks(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    fn save_tasks(&self, tasks: &[Task]) -> Result<(), StorageError> {
        self.lock().tasks = tasks.to_vec();
        Ok(())
    }

    fn seeds(&self) -> u64 {
        self.lock().seeds
    }

    fn save_seeds(&self, seeds: u64) -> Result<(), StorageError> {
        self.lock().seeds = seeds;
        Ok(())
    }

    fn unlocked_trees(&self) -> Vec<TreeKind> {
        self.lock()
            .unlocked_trees
            .clone()
            .unwrap_or_else(default_unlocked)
    }

    fn save_unlocked_trees(&self, trees: &[TreeKind]) -> Result<(), StorageError> {
        self.lock().unlocked_trees = Some(trees.to_vec());
        Ok(())
    }

    fn clear_all(&self) -> Result<(), StorageError> {
        *self.lock() = MemoryState::default();
        Ok(())
    }
}

// ── On disk ──────────────────────────────────────────────────────────

/// SQLite for history, rewards and small JSON blobs; TOML for settings.
pub struct LocalStore {
    db: Mutex<Database>,
    config_path: PathBuf,
}

impl LocalStore {
    /// Open the store in the default data directory.
    pub fn open() -> Result<Self, StorageError> {
        Self::open_in(&data_dir()?)
    }

    /// Open the store rooted at `dir` (`focusforest.db` + `config.toml`).
    pub fn open_in(dir: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(dir)?;
        let db = Database::open(&dir.join("focusforest.db"))?;
        Ok(Self {
            db: Mutex::new(db),
            config_path: dir.join("config.toml"),
        })
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Decode a JSON blob from the kv table, or `default` if it is missing
    /// or unreadable.
    fn kv_json<T: DeserializeOwned>(&self, key: &str, default: impl FnOnce() -> T) -> T {
        let raw = match self.db().kv_get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return default(),
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read stored value");
                return default();
            }
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "failed to parse stored value, using default");
            default()
        })
    }

    fn set_kv_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.db().kv_set(key, &raw)
    }

    fn or_default_logged<T: Default>(result: Result<T, StorageError>, what: &str) -> T {
        result.unwrap_or_else(|e| {
            tracing::warn!(what, error = %e, "read failed, using default");
            T::default()
        })
    }
}

impl Persistence for LocalStore {
    fn save_log(&self, log: &SessionLog) -> Result<(), StorageError> {
        self.db().insert_log(log)
    }

    fn logs(&self) -> Vec<SessionLog> {
        Self::or_default_logged(self.db().list_logs(), "logs")
    }

    fn save_reward(&self, reward: &Reward) -> Result<(), StorageError> {
        self.db().insert_reward(reward)
    }

    fn rewards(&self) -> Vec<Reward> {
        Self::or_default_logged(self.db().list_rewards(), "rewards")
    }

    fn save_rewards(&self, rewards: &[Reward]) -> Result<(), StorageError> {
        self.db().replace_rewards(rewards)
    }

    fn settings(&self) -> Config {
        Config::load_from_or_default(&self.config_path)
    }

    fn save_settings(&self, settings: &Config) -> Result<(), StorageError> {
        settings.validate()?;
        settings.save_to(&self.config_path)?;
        Ok(())
    }

    fn tasks(&self) -> Vec<Task> {
        self.kv_json(KEY_TASKS, Vec::new)
    }

    fn save_tasks(&self, tasks: &[Task]) -> Result<(), StorageError> {
        self.set_kv_json(KEY_TASKS, tasks)
    }

    fn seeds(&self) -> u64 {
        self.kv_json(KEY_SEEDS, || 0)
    }

    fn save_seeds(&self, seeds: u64) -> Result<(), StorageError> {
        self.set_kv_json(KEY_SEEDS, &seeds)
    }

    fn unlocked_trees(&self) -> Vec<TreeKind> {
        self.kv_json(KEY_UNLOCKED_TREES, default_unlocked)
    }

    fn save_unlocked_trees(&self, trees: &[TreeKind]) -> Result<(), StorageError> {
        self.set_kv_json(KEY_UNLOCKED_TREES, trees)
    }

    fn clear_all(&self) -> Result<(), StorageError> {
        self.db().clear()?;
        match std::fs::remove_file(&self.config_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reward::FruitKind;
    use crate::tasks::Priority;
    use crate::timer::Mode;
    use chrono::Utc;

    fn sample_log() -> SessionLog {
        SessionLog {
            id: "log-1".into(),
            started_at: Utc::now(),
            duration_minutes: 25,
            mode: Mode::Focus,
            subject: "Math".into(),
            completed: true,
            distractions: 0,
        }
    }

    /// Runs the same contract checks against any implementation.
    fn exercise(store: &dyn Persistence) {
        assert!(store.logs().is_empty());
        assert!(store.rewards().is_empty());
        assert!(store.tasks().is_empty());
        assert_eq!(store.seeds(), 0);
        assert_eq!(store.unlocked_trees(), vec![TreeKind::Oak]);
        assert_eq!(store.settings(), Config::default());

        store.save_log(&sample_log()).unwrap();
        store
            .save_reward(&Reward::new(FruitKind::Orange, "Math", "Oranges!"))
            .unwrap();
        store.save_tasks(&[Task::new("Essay", Priority::High)]).unwrap();
        store.save_seeds(30).unwrap();
        store
            .save_unlocked_trees(&[TreeKind::Oak, TreeKind::Palm])
            .unwrap();
        let mut settings = Config::default();
        settings.timer.hard_mode = true;
        store.save_settings(&settings).unwrap();

        assert_eq!(store.logs().len(), 1);
        assert_eq!(store.rewards()[0].kind, FruitKind::Orange);
        assert_eq!(store.tasks()[0].title, "Essay");
        assert_eq!(store.seeds(), 30);
        assert_eq!(store.unlocked_trees().len(), 2);
        assert!(store.settings().timer.hard_mode);

        store.save_rewards(&[]).unwrap();
        assert!(store.rewards().is_empty());

        store.clear_all().unwrap();
        assert!(store.logs().is_empty());
        assert_eq!(store.seeds(), 0);
        assert_eq!(store.unlocked_trees(), vec![TreeKind::Oak]);
        assert_eq!(store.settings(), Config::default());
    }

    #[test]
    fn memory_store_contract() {
        exercise(&MemoryStore::new());
    }

    #[test]
    fn local_store_contract() {
        let dir = tempfile::tempdir().unwrap();
        exercise(&LocalStore::open_in(dir.path()).unwrap());
    }

    #[test]
    fn local_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = LocalStore::open_in(dir.path()).unwrap();
            store.save_seeds(12).unwrap();
            store.save_log(&sample_log()).unwrap();
        }
        let store = LocalStore::open_in(dir.path()).unwrap();
        assert_eq!(store.seeds(), 12);
        assert_eq!(store.logs().len(), 1);
    }

    #[test]
    fn corrupt_blobs_read_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open_in(dir.path()).unwrap();
        store.db().kv_set(KEY_TASKS, "{not json").unwrap();
        store.db().kv_set(KEY_SEEDS, "\"lots\"").unwrap();
        store.db().kv_set(KEY_UNLOCKED_TREES, "[\"BAOBAB\"]").unwrap();
        std::fs::write(store.config_path(), "timer = 5").unwrap();

        assert!(store.tasks().is_empty());
        assert_eq!(store.seeds(), 0);
        assert_eq!(store.unlocked_trees(), vec![TreeKind::Oak]);
        assert_eq!(store.settings(), Config::default());
    }

    #[test]
    fn invalid_settings_are_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open_in(dir.path()).unwrap();
        let mut settings = Config::default();
        settings.timer.focus_duration = 0;
        assert!(store.save_settings(&settings).is_err());
        assert!(!store.config_path().exists());
    }
}
