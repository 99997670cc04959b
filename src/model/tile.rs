use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::item::{Inventory, ItemKey};
use super::permission::{Permission, PermissionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Grid {
    /// Home grid; units here are exempt from upkeep.
    Earth,
    Surface,
}

string_enum!(Grid {
    Earth => "earth",
    Surface => "surface",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coordinates {
    pub grid: Grid,
    pub x: i32,
    pub y: i32,
}

impl Coordinates {
    pub fn new(grid: Grid, x: i32, y: i32) -> Self {
        Self { grid, x, y }
    }

    /// True for the four orthogonal neighbours on the same grid.
    pub fn is_adjacent(&self, other: &Coordinates) -> bool {
        self.grid == other.grid && (self.x - other.x).abs() + (self.y - other.y).abs() == 1
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) on {}", self.x, self.y, self.grid)
    }
}

/// How survivable a tile is, worst first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Habitability {
    Deadly,
    Hostile,
    Unpleasant,
    Mediocre,
    #[default]
    Perfect,
}

impl Habitability {
    /// One step better, saturating at `Perfect`.
    pub fn improved(self) -> Habitability {
        match self {
            Habitability::Deadly => Habitability::Hostile,
            Habitability::Hostile => Habitability::Unpleasant,
            Habitability::Unpleasant => Habitability::Mediocre,
            Habitability::Mediocre | Habitability::Perfect => Habitability::Perfect,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum BuildingKind {
    TrainStation,
    Railroad,
    Port,
}

string_enum!(BuildingKind {
    TrainStation => "train_station",
    Railroad => "railroad",
    Port => "port",
});

/// A map location: the only channel for item transfer and environment queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub coordinates: Coordinates,
    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default)]
    pub inventory_capacity: f64,
    /// Buildings present, mapped to whether each is intact.
    #[serde(default)]
    pub buildings: BTreeMap<BuildingKind, bool>,
    #[serde(default)]
    pub habitability: Habitability,
    #[serde(default = "default_movement_cost")]
    pub movement_cost: f64,
}

fn default_movement_cost() -> f64 {
    1.0
}

impl Tile {
    pub fn new(coordinates: Coordinates) -> Self {
        Self {
            coordinates,
            inventory: Inventory::new(),
            inventory_capacity: 0.0,
            buildings: BTreeMap::new(),
            habitability: Habitability::Perfect,
            movement_cost: default_movement_cost(),
        }
    }

    pub fn with_building(mut self, kind: BuildingKind) -> Self {
        self.buildings.insert(kind, true);
        self
    }

    pub fn with_habitability(mut self, habitability: Habitability) -> Self {
        self.habitability = habitability;
        self
    }

    pub fn held_items(&self) -> Vec<ItemKey> {
        self.inventory.held_items().cloned().collect()
    }

    pub fn get_inventory(&self, key: &ItemKey) -> f64 {
        self.inventory.get(key)
    }

    pub fn change_inventory(&mut self, key: &ItemKey, delta: f64) {
        self.inventory.change(key, delta);
    }

    /// Consume up to `amount` of `key`, returning the amount actually consumed.
    pub fn consume_items(&mut self, key: &ItemKey, amount: f64) -> f64 {
        self.inventory.take(key, amount)
    }

    pub fn has_intact_building(&self, kind: BuildingKind) -> bool {
        self.buildings.get(&kind).copied().unwrap_or(false)
    }

    /// Habitability as experienced by a unit with `permissions`.
    /// Survivable units endure one step better than the bare tile.
    pub fn unit_habitability(&self, permissions: &PermissionStore) -> Habitability {
        if permissions.get_permission(Permission::Survivable) {
            self.habitability.improved()
        } else {
            self.habitability
        }
    }

    pub fn is_home(&self) -> bool {
        self.coordinates.grid == Grid::Earth
    }
}
