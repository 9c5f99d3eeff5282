//! Task list.
//!
//! Plain CRUD over the list held by the persistence collaborator. Every
//! operation loads the list, applies one change and writes it back.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Result, TaskError};
use crate::storage::Persistence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_estimate")]
    pub estimated_pomodoros: u32,
    #[serde(default)]
    pub completed_pomodoros: u32,
}

fn default_category() -> String {
    "General".into()
}

fn default_estimate() -> u32 {
    1
}

impl Task {
    pub fn new(title: impl Into<String>, priority: Priority) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            completed: false,
            priority,
            category: default_category(),
            estimated_pomodoros: default_estimate(),
            completed_pomodoros: 0,
        }
    }
}

pub fn list(store: &dyn Persistence) -> Vec<Task> {
    store.tasks()
}

/// Append a task. Blank titles are rejected.
pub fn add(store: &dyn Persistence, title: &str, priority: Priority) -> Result<Task> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TaskError::EmptyTitle.into());
    }
    let task = Task::new(title, priority);
    let mut tasks = store.tasks();
    tasks.push(task.clone());
    store.save_tasks(&tasks)?;
    Ok(task)
}

/// Flip the completed flag. Returns the updated task.
pub fn toggle(store: &dyn Persistence, id: &str) -> Result<Task> {
    let mut tasks = store.tasks();
    let task = tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| TaskError::UnknownTask(id.to_string()))?;
    task.completed = !task.completed;
    let updated = task.clone();
    store.save_tasks(&tasks)?;
    Ok(updated)
}

pub fn remove(store: &dyn Persistence, id: &str) -> Result<Task> {
    let mut tasks = store.tasks();
    let pos = tasks
        .iter()
        .position(|t| t.id == id)
        .ok_or_else(|| TaskError::UnknownTask(id.to_string()))?;
    let removed = tasks.remove(pos);
    store.save_tasks(&tasks)?;
    Ok(removed)
}
