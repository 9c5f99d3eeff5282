use clap::Subcommand;
use focusforest_core::garden::{self, TreeKind};
use focusforest_core::{FruitKind, Persistence};

use super::open_store;

#[derive(Subcommand)]
pub enum GardenAction {
    /// List harvested fruit and the seed balance
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Sell fruit for seeds
    Sell {
        /// Id of the fruit to sell
        #[arg(required_unless_present = "all")]
        id: Option<String>,
        /// Sell every fruit of this kind instead (apple, orange, ...)
        #[arg(long, conflicts_with = "id")]
        all: Option<FruitKind>,
    },
    /// Unlock a tree variant
    Buy {
        /// Tree variant (pine, maple, sakura, palm)
        tree: TreeKind,
    },
    /// Show tree variants and prices
    Trees,
}

pub fn run(action: GardenAction) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store()?;
    match action {
        GardenAction::List { json } => {
            if json {
                let out = serde_json::json!({
                    "summary": garden::summary(&store),
                    "fruit": store.rewards(),
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
                return Ok(());
            }
            let summary = garden::summary(&store);
            println!("Seeds: {}", summary.seeds);
            println!("Fruit: {}", summary.total_fruit);
            for reward in store.rewards() {
                println!(
                    "  {} {:<10} {}  {}",
                    reward.kind.emoji(),
                    reward.kind.name(),
                    reward.id,
                    reward.fact.as_deref().unwrap_or(""),
                );
            }
        }
        GardenAction::Sell { id, all } => {
            if let Some(kind) = all {
                let (count, balance) = garden::sell_all(&store, kind)?;
                println!("Sold {count} {kind}. Seeds: {balance}");
            } else if let Some(id) = id {
                let (sold, balance) = garden::sell_fruit(&store, &id)?;
                println!("Sold {} {}. Seeds: {balance}", sold.kind.emoji(), sold.kind.name());
            }
        }
        GardenAction::Buy { tree } => {
            let balance = garden::unlock_tree(&store, tree)?;
            println!("Unlocked {tree}. Seeds: {balance}");
        }
        GardenAction::Trees => {
            let unlocked = store.unlocked_trees();
            for tree in TreeKind::ALL {
                let status = if unlocked.contains(&tree) { "owned" } else { "" };
                println!("  {:<7} {:>4} seeds  {status}", tree.as_str(), tree.price());
            }
        }
    }
    Ok(())
}
