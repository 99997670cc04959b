use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A named capability flag carried by a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Permission {
    Worker,
    Officer,
    Group,
    Vehicle,
    Veteran,
    Disorganized,
    InGroup,
    InVehicle,
    SentryMode,
    Survivable,
    Dehydration,
    Starvation,
    Active,
    ActiveVehicle,
    InactiveVehicle,
    Driver,
    Porters,
    Train,
    Ship,
    EuropeanWorkers,
    ChurchVolunteers,
}

string_enum!(Permission {
    Worker => "worker",
    Officer => "officer",
    Group => "group",
    Vehicle => "vehicle",
    Veteran => "veteran",
    Disorganized => "disorganized",
    InGroup => "in_group",
    InVehicle => "in_vehicle",
    SentryMode => "sentry_mode",
    Survivable => "survivable",
    Dehydration => "dehydration",
    Starvation => "starvation",
    Active => "active",
    ActiveVehicle => "active_vehicle",
    InactiveVehicle => "inactive_vehicle",
    Driver => "driver",
    Porters => "porters",
    Train => "train",
    Ship => "ship",
    EuropeanWorkers => "european_workers",
    ChurchVolunteers => "church_volunteers",
});

impl Permission {
    /// The four mutually exclusive unit-class flags.
    pub const CLASSES: [Permission; 4] = [
        Permission::Worker,
        Permission::Officer,
        Permission::Group,
        Permission::Vehicle,
    ];

    /// Whether a change to this flag alters how the unit is drawn.
    pub fn affects_image(self) -> bool {
        matches!(
            self,
            Permission::Active
                | Permission::ActiveVehicle
                | Permission::InactiveVehicle
                | Permission::SentryMode
                | Permission::Veteran
                | Permission::Disorganized
        )
    }
}

/// Three-valued view of a single layer entry.
///
/// `Unset` resolves to false; it is distinct from an explicit `False` only in
/// that an unset override lets the base layer show through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionValue {
    #[default]
    Unset,
    True,
    False,
}

impl PermissionValue {
    pub fn resolve(self) -> bool {
        self == PermissionValue::True
    }
}

impl From<Option<bool>> for PermissionValue {
    fn from(v: Option<bool>) -> Self {
        match v {
            None => PermissionValue::Unset,
            Some(true) => PermissionValue::True,
            Some(false) => PermissionValue::False,
        }
    }
}

/// Per-unit capability map with a base layer and an override layer.
///
/// Resolution: an override entry wins when present, otherwise the base entry,
/// otherwise false. Lookups never fail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermissionStore {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    base: BTreeMap<Permission, bool>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    overrides: BTreeMap<Permission, bool>,
}

impl PermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(permissions: impl IntoIterator<Item = Permission>) -> Self {
        let mut store = Self::new();
        for p in permissions {
            store.set_permission(p, Some(true), false);
        }
        store
    }

    /// Effective tri-state value of `key` after override resolution.
    pub fn get_value(&self, key: Permission) -> PermissionValue {
        if let Some(v) = self.overrides.get(&key) {
            return Some(*v).into();
        }
        self.base.get(&key).copied().into()
    }

    pub fn get_permission(&self, key: Permission) -> bool {
        self.get_value(key).resolve()
    }

    /// Set or clear (`value = None`) an entry in the base or override layer.
    /// Returns whether the effective value changed.
    pub fn set_permission(&mut self, key: Permission, value: Option<bool>, is_override: bool) -> bool {
        let before = self.get_permission(key);
        let layer = if is_override {
            &mut self.overrides
        } else {
            &mut self.base
        };
        match value {
            Some(v) => {
                layer.insert(key, v);
            }
            None => {
                layer.remove(&key);
            }
        }
        before != self.get_permission(key)
    }

    pub fn any_permissions(&self, keys: &[Permission]) -> bool {
        keys.iter().any(|k| self.get_permission(*k))
    }

    pub fn all_permissions(&self, keys: &[Permission]) -> bool {
        keys.iter().all(|k| self.get_permission(*k))
    }

    /// Every permission that currently resolves to true.
    pub fn granted(&self) -> impl Iterator<Item = Permission> + '_ {
        Permission::ALL
            .iter()
            .copied()
            .filter(|p| self.get_permission(*p))
    }

    pub fn has_override(&self, key: Permission) -> bool {
        self.overrides.contains_key(&key)
    }
}
