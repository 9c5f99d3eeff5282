//! SQLite-based storage.
//!
//! Provides persistent storage for:
//! - Session logs (append-only history used by analytics)
//! - Earned fruit rewards
//! - Key-value store for tasks, seeds and unlocked trees

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageError;
use crate::reward::{FruitKind, Reward};
use crate::timer::{Mode, SessionSummary};

/// One finished or abandoned session. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionLog {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub duration_minutes: u64,
    pub mode: Mode,
    pub subject: String,
    pub completed: bool,
    #[serde(default)]
    pub distractions: u32,
}

impl SessionLog {
    /// Completed sessions record the configured length; abandoned ones the
    /// whole minutes actually spent.
    pub fn from_summary(summary: &SessionSummary) -> Self {
        let secs = if summary.completed {
            summary.duration_secs
        } else {
            summary.elapsed_secs()
        };
        Self {
            id: Uuid::new_v4().to_string(),
            started_at: summary.started_at,
            duration_minutes: secs / 60,
            mode: summary.mode,
            subject: summary.subject.clone(),
            completed: summary.completed,
            distractions: summary.distraction_count,
        }
    }
}

/// Fixed-width RFC 3339 so stored timestamps sort as text.
fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// SQLite database for logs, rewards and small JSON blobs.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open (creating if needed) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::init(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        super::migrations::migrate(&conn)
            .map_err(|e| StorageError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    // ── Session logs ─────────────────────────────────────────────────

    pub fn insert_log(&self, log: &SessionLog) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO session_logs (id, started_at, duration_minutes, mode, subject, completed, distractions)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                log.id,
                timestamp(&log.started_at),
                log.duration_minutes,
                log.mode.as_str(),
                log.subject,
                log.completed,
                log.distractions,
            ],
        )?;
        Ok(())
    }

    /// All logs, oldest first. Rows that fail to decode are skipped.
    pub fn list_logs(&self) -> Result<Vec<SessionLog>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, duration_minutes, mode, subject, completed, distractions
             FROM session_logs
             ORDER BY started_at ASC, rowid ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, bool>(5)?,
                row.get::<_, u32>(6)?,
            ))
        })?;

        let mut logs = Vec::new();
        for row in rows {
            let (id, started_at, duration_minutes, mode, subject, completed, distractions) = row?;
            let decoded = DateTime::parse_from_rfc3339(&started_at)
                .map_err(|e| e.to_string())
                .and_then(|t| mode.parse::<Mode>().map(|m| (t.with_timezone(&Utc), m)));
            match decoded {
                Ok((started_at, mode)) => logs.push(SessionLog {
                    id,
                    started_at,
                    duration_minutes,
                    mode,
                    subject,
                    completed,
                    distractions,
                }),
                Err(e) => tracing::warn!(id = %id, error = %e, "skipping undecodable session log"),
            }
        }
        Ok(logs)
    }

    // ── Rewards ──────────────────────────────────────────────────────

    pub fn insert_reward(&self, reward: &Reward) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO rewards (id, kind, earned_at, subject, fact)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                reward.id,
                reward.kind.as_str(),
                timestamp(&reward.earned_at),
                reward.subject,
                reward.fact,
            ],
        )?;
        Ok(())
    }

    /// All rewards, oldest first. Rows that fail to decode are skipped.
    pub fn list_rewards(&self) -> Result<Vec<Reward>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, earned_at, subject, fact FROM rewards ORDER BY earned_at ASC, rowid ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;

        let mut rewards = Vec::new();
        for row in rows {
            let (id, kind, earned_at, subject, fact) = row?;
            let decoded = kind.parse::<FruitKind>().and_then(|k| {
                DateTime::parse_from_rfc3339(&earned_at)
                    .map(|t| (k, t.with_timezone(&Utc)))
                    .map_err(|e| e.to_string())
            });
            match decoded {
                Ok((kind, earned_at)) => rewards.push(Reward {
                    id,
                    kind,
                    earned_at,
                    subject,
                    fact,
                }),
                Err(e) => tracing::warn!(id = %id, error = %e, "skipping undecodable reward"),
            }
        }
        Ok(rewards)
    }

    /// Replace the whole reward collection.
    pub fn replace_rewards(&mut self, rewards: &[Reward]) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM rewards", [])?;
        for reward in rewards {
            tx.execute(
                "INSERT INTO rewards (id, kind, earned_at, subject, fact) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    reward.id,
                    reward.kind.as_str(),
                    timestamp(&reward.earned_at),
                    reward.subject,
                    reward.fact,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ── Key-value ────────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Delete everything except the schema.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.conn
            .execute_batch("DELETE FROM session_logs; DELETE FROM rewards; DELETE FROM kv;")?;
        Ok(())
    }
}
