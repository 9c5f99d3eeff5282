//! Garden economy: sell fruit for seeds, spend seeds on tree variants.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{GardenError, Result};
use crate::reward::{FruitKind, Reward};
use crate::storage::Persistence;

/// Seeds credited for each fruit sold.
pub const FRUIT_SELL_PRICE: u64 = 10;

/// Cosmetic tree variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TreeKind {
    Oak,
    Pine,
    Maple,
    Sakura,
    Palm,
}

impl TreeKind {
    pub const ALL: [TreeKind; 5] = [
        TreeKind::Oak,
        TreeKind::Pine,
        TreeKind::Maple,
        TreeKind::Sakura,
        TreeKind::Palm,
    ];

    pub fn price(self) -> u64 {
        match self {
            TreeKind::Oak => 0,
            TreeKind::Pine => 50,
            TreeKind::Maple => 100,
            TreeKind::Sakura => 150,
            TreeKind::Palm => 200,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TreeKind::Oak => "OAK",
            TreeKind::Pine => "PINE",
            TreeKind::Maple => "MAPLE",
            TreeKind::Sakura => "SAKURA",
            TreeKind::Palm => "PALM",
        }
    }
}

impl fmt::Display for TreeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TreeKind {
    type Err = GardenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GardenError::UnknownTree(s.to_string()))
    }
}

/// What a fresh garden owns.
pub fn default_unlocked() -> Vec<TreeKind> {
    vec![TreeKind::Oak]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GardenSummary {
    pub seeds: u64,
    pub fruit_counts: BTreeMap<String, usize>,
    pub total_fruit: usize,
    pub unlocked_trees: Vec<TreeKind>,
}

pub fn summary(store: &dyn Persistence) -> GardenSummary {
    let rewards = store.rewards();
    let mut fruit_counts = BTreeMap::new();
    for reward in &rewards {
        *fruit_counts.entry(reward.kind.as_str().to_string()).or_insert(0) += 1;
    }
    GardenSummary {
        seeds: store.seeds(),
        fruit_counts,
        total_fruit: rewards.len(),
        unlocked_trees: store.unlocked_trees(),
    }
}

/// Sell one fruit. Returns the sold reward and the new seed balance.
pub fn sell_fruit(store: &dyn Persistence, reward_id: &str) -> Result<(Reward, u64)> {
    let mut rewards = store.rewards();
    let pos = rewards
        .iter()
        .position(|r| r.id == reward_id)
        .ok_or_else(|| GardenError::UnknownFruit(reward_id.to_string()))?;
    let sold = rewards.remove(pos);
    let balance = store.seeds().saturating_add(FRUIT_SELL_PRICE);

    store.save_rewards(&rewards)?;
    store.save_seeds(balance)?;
    tracing::info!(fruit = %sold.kind, balance, "fruit sold");
    Ok((sold, balance))
}

/// Sell every fruit of `kind`. Returns how many were sold and the new balance.
pub fn sell_all(store: &dyn Persistence, kind: FruitKind) -> Result<(usize, u64)> {
    let (sold, kept): (Vec<Reward>, Vec<Reward>) =
        store.rewards().into_iter().partition(|r| r.kind == kind);
    if sold.is_empty() {
        return Ok((0, store.seeds()));
    }
    let balance = store
        .seeds()
        .saturating_add(FRUIT_SELL_PRICE.saturating_mul(sold.len() as u64));
    store.save_rewards(&kept)?;
    store.save_seeds(balance)?;
    Ok((sold.len(), balance))
}

/// Buy a tree variant. Nothing changes if the purchase is rejected.
pub fn unlock_tree(store: &dyn Persistence, tree: TreeKind) -> Result<u64> {
    let mut unlocked = store.unlocked_trees();
    if unlocked.contains(&tree) {
        return Err(GardenError::AlreadyUnlocked(tree.to_string()).into());
    }
    let seeds = store.seeds();
    let price = tree.price();
    if seeds < price {
        return Err(GardenError::InsufficientSeeds {
            needed: price,
            available: seeds,
        }
        .into());
    }

    let balance = seeds - price;
    unlocked.push(tree);
    store.save_seeds(balance)?;
    store.save_unlocked_trees(&unlocked)?;
    tracing::info!(tree = %tree, balance, "tree unlocked");
    Ok(balance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::storage::MemoryStore;

    fn store_with_fruit(kinds: &[FruitKind]) -> MemoryStore {
        let store = MemoryStore::new();
        for kind in kinds {
            store.save_reward(&Reward::new(*kind, "Math", "fact")).unwrap();
        }
        store
    }

    #[test]
    fn fresh_garden_owns_an_oak() {
        let store = MemoryStore::new();
        let s = summary(&store);
        assert_eq!(s.seeds, 0);
        assert_eq!(s.unlocked_trees, vec![TreeKind::Oak]);
        assert_eq!(s.total_fruit, 0);
    }

    #[test]
    fn selling_credits_seeds() {
        let store = store_with_fruit(&[FruitKind::Apple, FruitKind::Lemon]);
        let id = store.rewards()[0].id.clone();
        let (sold, balance) = sell_fruit(&store, &id).unwrap();
        assert_eq!(sold.kind, FruitKind::Apple);
        assert_eq!(balance, FRUIT_SELL_PRICE);
        assert_eq!(store.rewards().len(), 1);
        assert_eq!(store.seeds(), FRUIT_SELL_PRICE);
    }

    #[test]
    fn selling_unknown_fruit_fails() {
        let store = store_with_fruit(&[FruitKind::Apple]);
        assert!(matches!(
            sell_fruit(&store, "missing"),
            Err(CoreError::Garden(GardenError::UnknownFruit(_)))
        ));
        assert_eq!(store.seeds(), 0);
    }

    #[test]
    fn sell_all_of_a_kind() {
        let store = store_with_fruit(&[FruitKind::Cherry, FruitKind::Apple, FruitKind::Cherry]);
        let (count, balance) = sell_all(&store, FruitKind::Cherry).unwrap();
        assert_eq!(count, 2);
        assert_eq!(balance, 20);
        assert_eq!(summary(&store).fruit_counts.get("APPLE"), Some(&1));
        assert_eq!(sell_all(&store, FruitKind::Lemon).unwrap(), (0, 20));
    }

    #[test]
    fn unlock_debits_seeds() {
        let store = MemoryStore::new();
        store.save_seeds(60).unwrap();
        assert_eq!(unlock_tree(&store, TreeKind::Pine).unwrap(), 10);
        assert!(store.unlocked_trees().contains(&TreeKind::Pine));
    }

    #[test]
    fn rejected_purchases_change_nothing() {
        let store = MemoryStore::new();
        store.save_seeds(40).unwrap();
        assert!(matches!(
            unlock_tree(&store, TreeKind::Pine),
            Err(CoreError::Garden(GardenError::InsufficientSeeds { needed: 50, available: 40 }))
        ));
        assert!(matches!(
            unlock_tree(&store, TreeKind::Oak),
            Err(CoreError::Garden(GardenError::AlreadyUnlocked(_)))
        ));
        assert_eq!(store.seeds(), 40);
        assert_eq!(store.unlocked_trees(), vec![TreeKind::Oak]);
    }

    #[test]
    fn parse_tree_names() {
        assert_eq!("sakura".parse::<TreeKind>().unwrap(), TreeKind::Sakura);
        assert_eq!(
            "baobab".parse::<TreeKind>(),
            Err(GardenError::UnknownTree("baobab".into()))
        );
    }
}
