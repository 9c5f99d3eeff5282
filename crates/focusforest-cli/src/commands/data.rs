use clap::Subcommand;
use focusforest_core::Persistence;

use super::open_store;

#[derive(Subcommand)]
pub enum DataAction {
    /// Delete history, fruit, seeds, tasks and settings
    Clear {
        /// Required; there is no undo
        #[arg(long)]
        yes: bool,
    },
    /// Print the data directory
    Path,
}

pub fn run(action: DataAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        DataAction::Clear { yes } => {
            if !yes {
                return Err("refusing to clear data without --yes".into());
            }
            open_store()?.clear_all()?;
            println!("all data cleared");
        }
        DataAction::Path => {
            println!("{}", focusforest_core::storage::data_dir()?.display());
        }
    }
    Ok(())
}
