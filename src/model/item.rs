use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Quantities below this are treated as zero.
pub const QUANTITY_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ItemKey {
    Food,
    Water,
    Air,
    ConsumerGoods,
    Fuel,
    Custom(String),
}

string_enum_open!(ItemKey, "item key", {
    Food => "food",
    Water => "water",
    Air => "air",
    ConsumerGoods => "consumer_goods",
    Fuel => "fuel",
});

/// What happens to a unit that goes a turn without a required item.
///
/// Strictly ordered by severity so the worst of several missing items is
/// `Iterator::max`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum UpkeepPenalty {
    #[default]
    None,
    Morale,
    Starvation,
    Dehydration,
    Death,
}

/// Catalogue entry for a kind of item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemType {
    pub key: ItemKey,
    pub name: String,
    /// Penalty applied when a unit requiring this item goes without.
    #[serde(default)]
    pub upkeep_penalty: UpkeepPenalty,
}

/// Item stockpile keyed by item. Zero entries are never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    items: BTreeMap<ItemKey, f64>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ItemKey) -> f64 {
        self.items.get(key).copied().unwrap_or(0.0)
    }

    /// Add `delta` (possibly negative) to `key`.
    ///
    /// # Panics
    /// Panics if the result would be meaningfully negative.
    pub fn change(&mut self, key: &ItemKey, delta: f64) {
        let new = self.get(key) + delta;
        assert!(
            new > -QUANTITY_EPSILON,
            "Inventory::change: {key} would drop to {new}"
        );
        if new <= QUANTITY_EPSILON {
            self.items.remove(key);
        } else {
            self.items.insert(key.clone(), new);
        }
    }

    /// Remove up to `amount` of `key`, returning how much was actually taken.
    pub fn take(&mut self, key: &ItemKey, amount: f64) -> f64 {
        let taken = self.get(key).min(amount);
        if taken > 0.0 {
            self.change(key, -taken);
        }
        taken
    }

    pub fn total(&self) -> f64 {
        self.items.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Keys with a positive quantity.
    pub fn held_items(&self) -> impl Iterator<Item = &ItemKey> {
        self.items.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ItemKey, f64)> {
        self.items.iter().map(|(k, v)| (k, *v))
    }

    /// Empty this inventory, returning its former contents.
    pub fn drain(&mut self) -> Inventory {
        std::mem::take(self)
    }

    pub fn absorb(&mut self, other: Inventory) {
        for (key, amount) in other.items {
            self.change(&key, amount);
        }
    }
}

impl FromIterator<(ItemKey, f64)> for Inventory {
    fn from_iter<T: IntoIterator<Item = (ItemKey, f64)>>(iter: T) -> Self {
        let mut inv = Inventory::new();
        for (key, amount) in iter {
            inv.change(&key, amount);
        }
        inv
    }
}
