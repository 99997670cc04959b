//! Data-driven rules: item, unit, worker, and equipment catalogues.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::item::{ItemKey, ItemType, UpkeepPenalty};
use crate::model::permission::Permission;
use crate::model::unit_type::{
    EquipmentType, ReplacementSource, UnitClass, UnitType, VehicleKind, WorkerType,
};

/// Names and voices available to officers of one ethnicity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamePool {
    pub ethnicity: String,
    pub masculine_names: Vec<String>,
    pub feminine_names: Vec<String>,
    pub surnames: Vec<String>,
    pub masculine_voices: Vec<String>,
    pub feminine_voices: Vec<String>,
}

/// Rule catalogue loaded once per game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rules {
    pub item_types: Vec<ItemType>,
    pub unit_types: Vec<UnitType>,
    pub worker_types: Vec<WorkerType>,
    #[serde(default)]
    pub equipment_types: Vec<EquipmentType>,
    #[serde(default)]
    pub name_pools: Vec<NamePool>,
    /// Fixed max movement for veteran drivers' groups and promoted porters.
    #[serde(default = "default_fixed_movement")]
    pub fixed_group_movement_points: f64,
}

fn default_fixed_movement() -> f64 {
    6.0
}

impl Rules {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn unit_type(&self, key: &str) -> Option<&UnitType> {
        self.unit_types.iter().find(|t| t.key == key)
    }

    pub fn equipment_type(&self, key: &ItemKey) -> Option<&EquipmentType> {
        self.equipment_types.iter().find(|t| &t.key == key)
    }

    /// Penalty for going without `key`; items not in the catalogue carry none.
    pub fn item_penalty(&self, key: &ItemKey) -> UpkeepPenalty {
        self.item_types
            .iter()
            .find(|t| &t.key == key)
            .map_or(UpkeepPenalty::None, |t| t.upkeep_penalty)
    }

    /// Lower-case display name of an item, for report text.
    pub fn item_name(&self, key: &ItemKey) -> String {
        self.item_types
            .iter()
            .find(|t| &t.key == key)
            .map_or_else(|| key.as_str().replace('_', " "), |t| t.name.to_lowercase())
    }

    pub fn name_pool(&self, ethnicity: &str) -> Option<&NamePool> {
        self.name_pools.iter().find(|p| p.ethnicity == ethnicity)
    }
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn upkeep(entries: &[(ItemKey, f64)]) -> BTreeMap<ItemKey, f64> {
    entries.iter().cloned().collect()
}

fn unit_type(key: &str, name: &str, class: UnitClass, max_movement_points: f64) -> UnitType {
    UnitType {
        key: key.to_string(),
        name: name.to_string(),
        class,
        max_movement_points,
        upkeep: BTreeMap::new(),
        inventory_capacity: 0.0,
        permissions: Vec::new(),
        vehicle_kind: None,
        group_type: None,
    }
}

impl Default for Rules {
    /// The standard colonial ruleset.
    fn default() -> Self {
        let person_upkeep = upkeep(&[
            (ItemKey::Food, 1.0),
            (ItemKey::Water, 1.0),
            (ItemKey::Air, 1.0),
        ]);
        let officer_upkeep = upkeep(&[
            (ItemKey::Food, 1.0),
            (ItemKey::Water, 1.0),
            (ItemKey::Air, 1.0),
            (ItemKey::ConsumerGoods, 0.5),
        ]);

        let colonists = UnitType {
            upkeep: person_upkeep.clone(),
            ..unit_type("colonists", "Colonists", UnitClass::Worker, 4.0)
        };
        let explorer = UnitType {
            upkeep: officer_upkeep.clone(),
            group_type: Some("expedition".to_string()),
            ..unit_type("explorer", "Explorer", UnitClass::Officer, 4.0)
        };
        let driver = UnitType {
            upkeep: officer_upkeep,
            permissions: vec![Permission::Driver],
            group_type: Some("porters".to_string()),
            ..unit_type("driver", "Driver", UnitClass::Officer, 4.0)
        };
        let expedition = unit_type("expedition", "Expedition", UnitClass::Group, 0.0);
        let porters = UnitType {
            inventory_capacity: 9.0,
            permissions: vec![Permission::Porters],
            ..unit_type("porters", "Porters", UnitClass::Group, 0.0)
        };
        let wagon = UnitType {
            inventory_capacity: 9.0,
            vehicle_kind: Some(VehicleKind::Wagon),
            ..unit_type("wagon", "Wagon", UnitClass::Vehicle, 6.0)
        };
        let train = UnitType {
            inventory_capacity: 27.0,
            upkeep: upkeep(&[(ItemKey::Fuel, 1.0)]),
            vehicle_kind: Some(VehicleKind::Train),
            ..unit_type("train", "Train", UnitClass::Vehicle, 8.0)
        };
        let steamship = UnitType {
            inventory_capacity: 27.0,
            upkeep: upkeep(&[(ItemKey::Fuel, 1.0)]),
            vehicle_kind: Some(VehicleKind::Ship),
            ..unit_type("steamship", "Steamship", UnitClass::Vehicle, 10.0)
        };

        Self {
            item_types: vec![
                ItemType {
                    key: ItemKey::Food,
                    name: "Food".to_string(),
                    upkeep_penalty: UpkeepPenalty::Starvation,
                },
                ItemType {
                    key: ItemKey::Water,
                    name: "Water".to_string(),
                    upkeep_penalty: UpkeepPenalty::Dehydration,
                },
                ItemType {
                    key: ItemKey::Air,
                    name: "Air".to_string(),
                    upkeep_penalty: UpkeepPenalty::Death,
                },
                ItemType {
                    key: ItemKey::ConsumerGoods,
                    name: "Consumer goods".to_string(),
                    upkeep_penalty: UpkeepPenalty::Morale,
                },
                ItemType {
                    key: ItemKey::Fuel,
                    name: "Fuel".to_string(),
                    upkeep_penalty: UpkeepPenalty::None,
                },
            ],
            unit_types: vec![
                colonists, explorer, driver, expedition, porters, wagon, train, steamship,
            ],
            worker_types: vec![
                WorkerType {
                    key: "european_workers".to_string(),
                    name: "European workers".to_string(),
                    unit_type: "colonists".to_string(),
                    permissions: vec![Permission::EuropeanWorkers],
                    replacement_source: ReplacementSource::Hired,
                    number: 0,
                    recruited: 0,
                },
                WorkerType {
                    key: "church_volunteers".to_string(),
                    name: "Church volunteers".to_string(),
                    unit_type: "colonists".to_string(),
                    permissions: vec![Permission::ChurchVolunteers],
                    replacement_source: ReplacementSource::Volunteers,
                    number: 0,
                    recruited: 0,
                },
            ],
            equipment_types: vec![
                EquipmentType {
                    key: ItemKey::from("pack_saddles"),
                    requirements: vec![Permission::Group, Permission::Porters],
                    grants: vec![],
                },
                EquipmentType {
                    key: ItemKey::from("spacesuits"),
                    requirements: vec![],
                    grants: vec![Permission::Survivable],
                },
            ],
            name_pools: vec![
                NamePool {
                    ethnicity: "english".to_string(),
                    masculine_names: names(&["Henry", "Arthur", "Edward", "Thomas"]),
                    feminine_names: names(&["Mary", "Alice", "Edith", "Margaret"]),
                    surnames: names(&["Stanley", "Baker", "Burton", "Speke"]),
                    masculine_voices: names(&["masculine_0", "masculine_1"]),
                    feminine_voices: names(&["feminine_0", "feminine_1"]),
                },
                NamePool {
                    ethnicity: "french".to_string(),
                    masculine_names: names(&["Pierre", "Louis", "Jacques"]),
                    feminine_names: names(&["Marie", "Jeanne", "Claire"]),
                    surnames: names(&["Brazza", "Mizon", "Marchand"]),
                    masculine_voices: names(&["masculine_0", "masculine_1"]),
                    feminine_voices: names(&["feminine_0", "feminine_1"]),
                },
            ],
            fixed_group_movement_points: default_fixed_movement(),
        }
    }
}
