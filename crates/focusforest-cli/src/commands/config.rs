use clap::Subcommand;
use focusforest_core::content::gemini;
use focusforest_core::{Config, Persistence};

use super::open_store;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "timer.focus_duration", "sound.music_volume")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Store the Gemini API key in the OS keyring
    SetApiKey {
        key: String,
    },
    /// Remove the stored Gemini API key
    ForgetApiKey,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store()?;
    match action {
        ConfigAction::Get { key } => {
            let config = store.settings();
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = store.settings();
            config.set(&key, &value)?;
            store.save_settings(&config)?;
            println!("ok");
        }
        ConfigAction::List => {
            let config = store.settings();
            let json = serde_json::to_string_pretty(&config)?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            store.save_settings(&Config::default())?;
            println!("config reset to defaults");
        }
        ConfigAction::SetApiKey { key } => {
            let key = key.trim();
            if key.is_empty() {
                return Err("API key must not be empty".into());
            }
            gemini::store_api_key(key)?;
            println!("API key stored");
        }
        ConfigAction::ForgetApiKey => {
            gemini::forget_api_key()?;
            println!("API key removed");
        }
    }
    Ok(())
}
