use clap::Subcommand;
use focusforest_core::tasks::{self, Priority};

use super::open_store;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task
    Add {
        title: String,
        /// low, medium or high
        #[arg(long, default_value = "medium")]
        priority: Priority,
    },
    /// List tasks
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a task done, or not done again
    Toggle { id: String },
    /// Delete a task
    Remove { id: String },
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store()?;
    match action {
        TaskAction::Add { title, priority } => {
            let task = tasks::add(&store, &title, priority)?;
            println!("Task added: {}", task.id);
        }
        TaskAction::List { json } => {
            let list = tasks::list(&store);
            if json {
                println!("{}", serde_json::to_string_pretty(&list)?);
                return Ok(());
            }
            if list.is_empty() {
                println!("No tasks.");
            }
            for task in list {
                let mark = if task.completed { "x" } else { " " };
                println!(
                    "[{mark}] {:<6} {}  ({}/{} pomodoros)  {}",
                    format!("{:?}", task.priority).to_uppercase(),
                    task.title,
                    task.completed_pomodoros,
                    task.estimated_pomodoros,
                    task.id,
                );
            }
        }
        TaskAction::Toggle { id } => {
            let task = tasks::toggle(&store, &id)?;
            let state = if task.completed { "done" } else { "open" };
            println!("{}: {state}", task.title);
        }
        TaskAction::Remove { id } => {
            let task = tasks::remove(&store, &id)?;
            println!("Removed: {}", task.title);
        }
    }
    Ok(())
}
