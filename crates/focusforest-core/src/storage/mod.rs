pub mod config;
pub mod database;
pub mod migrations;
mod store;

pub use config::Config;
pub use database::{Database, SessionLog};
pub use store::{LocalStore, MemoryStore, Persistence};

use std::path::PathBuf;

/// Data directory: `$FOCUSFOREST_HOME` if set, otherwise
/// `~/.config/focusforest[-dev]/` based on FOCUSFOREST_ENV.
///
/// Set FOCUSFOREST_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("FOCUSFOREST_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSFOREST_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusforest-dev")
            } else {
                base_dir.join("focusforest")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
