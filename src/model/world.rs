use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::effect::{Effect, IncidentKind, LogisticsIncident};
use super::permission::Permission;
use super::tile::{Coordinates, Habitability, Tile};
use super::unit::{Pmob, UnitKind};
use super::unit_type::{UnitClass, UnitType, WorkerType};
use crate::error::UnitError;
use crate::id::{IdGenerator, UnitId};
use crate::rules::Rules;

/// Why a unit left play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DeathCause {
    Killed,
    Upkeep,
    Attrition,
    Fired,
}

string_enum!(DeathCause {
    Killed => "killed",
    Upkeep => "upkeep",
    Attrition => "attrition",
    Fired => "fired",
});

/// Simulation context: owns every registry the unit layer reads or mutates.
#[derive(Debug)]
pub struct World {
    pub rules: Rules,
    /// Live units. Presence here is the only "alive" predicate.
    pub units: BTreeMap<UnitId, Pmob>,
    pub tiles: BTreeMap<Coordinates, Tile>,
    /// Labor pools keyed by worker type, with population counters.
    pub worker_types: BTreeMap<String, WorkerType>,
    /// Presentation directives, in the order they happened.
    pub effects: Vec<Effect>,
    pub incidents: Vec<LogisticsIncident>,
    pub id_gen: IdGenerator,
    pub turn: u32,
    /// Unit currently shown in the info display.
    pub displayed: Option<UnitId>,
}

impl World {
    pub fn new(rules: Rules) -> Self {
        let worker_types = rules
            .worker_types
            .iter()
            .map(|wt| (wt.key.clone(), wt.clone()))
            .collect();
        Self {
            rules,
            units: BTreeMap::new(),
            tiles: BTreeMap::new(),
            worker_types,
            effects: Vec::new(),
            incidents: Vec::new(),
            id_gen: IdGenerator::new(),
            turn: 0,
            displayed: None,
        }
    }

    pub fn add_tile(&mut self, tile: Tile) {
        self.tiles.insert(tile.coordinates, tile);
    }

    pub fn tile(&self, coordinates: Coordinates) -> Option<&Tile> {
        self.tiles.get(&coordinates)
    }

    /// Tile at `coordinates`, created bare on first touch.
    pub fn tile_mut(&mut self, coordinates: Coordinates) -> &mut Tile {
        self.tiles
            .entry(coordinates)
            .or_insert_with(|| Tile::new(coordinates))
    }

    /// Habitability experienced by `id` on its current tile.
    pub fn unit_habitability(&self, id: UnitId) -> Habitability {
        let unit = self.expect_unit(id, "unit_habitability");
        self.tile(unit.location)
            .map_or(Habitability::Perfect, |t| t.unit_habitability(&unit.permissions))
    }

    /// Habitability `id` actually lives in: the best of its own and every
    /// container above it, so a suited group shelters its members.
    ///
    /// # Panics
    /// Panics if `id` or any of its containers is not in the registry.
    pub fn experienced_habitability(&self, id: UnitId) -> Habitability {
        let mut best = self.unit_habitability(id);
        let mut current = self.expect_unit(id, "experienced_habitability").container;
        while let Some(container) = current {
            let holder = container.holder();
            best = best.max(self.unit_habitability(holder));
            current = self.expect_unit(holder, "experienced_habitability").container;
        }
        best
    }

    pub fn unit(&self, id: UnitId) -> Option<&Pmob> {
        self.units.get(&id)
    }

    pub fn unit_mut(&mut self, id: UnitId) -> Option<&mut Pmob> {
        self.units.get_mut(&id)
    }

    pub fn is_alive(&self, id: UnitId) -> bool {
        self.units.contains_key(&id)
    }

    /// # Panics
    /// Panics if `id` is not in the registry.
    pub(crate) fn expect_unit(&self, id: UnitId, caller: &str) -> &Pmob {
        self.units
            .get(&id)
            .unwrap_or_else(|| panic!("{caller}: unit {id} not found"))
    }

    /// # Panics
    /// Panics if `id` is not in the registry.
    pub(crate) fn expect_unit_mut(&mut self, id: UnitId, caller: &str) -> &mut Pmob {
        self.units
            .get_mut(&id)
            .unwrap_or_else(|| panic!("{caller}: unit {id} not found"))
    }

    pub fn get(&self, id: UnitId) -> Result<&Pmob, UnitError> {
        self.units.get(&id).ok_or(UnitError::UnknownUnit(id))
    }

    pub fn require_class(&self, id: UnitId, expected: UnitClass) -> Result<&Pmob, UnitError> {
        let unit = self.get(id)?;
        if unit.class() != expected {
            return Err(UnitError::WrongClass {
                id,
                expected,
                actual: unit.class(),
            });
        }
        Ok(unit)
    }

    pub fn require_independent(&self, id: UnitId) -> Result<&Pmob, UnitError> {
        let unit = self.get(id)?;
        if !unit.is_independent() {
            return Err(UnitError::NotIndependent(id));
        }
        Ok(unit)
    }

    pub fn require_colocated(&self, a: UnitId, b: UnitId) -> Result<(), UnitError> {
        if self.get(a)?.location != self.get(b)?.location {
            return Err(UnitError::NotColocated(a, b));
        }
        Ok(())
    }

    pub fn unit_type(&self, key: &str) -> Result<&UnitType, UnitError> {
        self.rules
            .unit_type(key)
            .ok_or_else(|| UnitError::UnknownUnitType(key.to_string()))
    }

    /// Set a permission on a live unit, emitting `RefreshImage` when the
    /// effective value changed and the flag is drawn.
    /// Returns whether the effective value changed.
    ///
    /// # Panics
    /// Panics if `id` is not in the registry.
    pub fn set_permission(
        &mut self,
        id: UnitId,
        key: Permission,
        value: Option<bool>,
        is_override: bool,
        update_image: bool,
    ) -> bool {
        let unit = self.expect_unit_mut(id, "set_permission");
        let changed = unit.permissions.set_permission(key, value, is_override);
        if changed && update_image && key.affects_image() {
            self.effects.push(Effect::RefreshImage { unit_id: id });
        }
        changed
    }

    pub fn emit(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.effects.push(Effect::notification(message));
    }

    /// Take all pending presentation directives.
    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Give selection to `id` and recalibrate the info display.
    pub fn select(&mut self, id: UnitId) {
        self.displayed = Some(id);
        self.effects.push(Effect::Select { unit_id: id });
        self.effects.push(Effect::CalibrateDisplay { unit_id: Some(id) });
    }

    /// Independent units standing on `coordinates`.
    pub fn units_at(&self, coordinates: Coordinates) -> Vec<UnitId> {
        self.units
            .values()
            .filter(|u| u.is_independent() && u.location == coordinates)
            .map(|u| u.id)
            .collect()
    }

    /// Units with moves left this turn, derived from unit state.
    pub fn turn_queue(&self) -> Vec<UnitId> {
        self.units
            .values()
            .filter(|u| u.in_turn_queue())
            .map(|u| u.id)
            .collect()
    }

    pub fn independent_units(&self) -> Vec<UnitId> {
        self.units
            .values()
            .filter(|u| u.is_independent())
            .map(|u| u.id)
            .collect()
    }

    /// # Panics
    /// Panics if the unit's id is already live.
    pub(crate) fn insert_unit(&mut self, unit: Pmob) {
        let id = unit.id;
        assert!(
            !self.units.contains_key(&id),
            "insert_unit: unit {id} already exists"
        );
        self.id_gen.reserve(id);
        self.units.insert(id, unit);
    }

    /// Take a unit out of play. Workers leave their labor pool.
    ///
    /// # Panics
    /// Panics if `id` is not in the registry.
    pub(crate) fn remove_unit(&mut self, id: UnitId) -> Pmob {
        let unit = self
            .units
            .remove(&id)
            .unwrap_or_else(|| panic!("remove_unit: unit {id} not found"));
        if let UnitKind::Worker(w) = &unit.kind {
            if let Some(pool) = self.worker_types.get_mut(&w.worker_type) {
                pool.number = pool.number.saturating_sub(1);
            }
        }
        if self.displayed == Some(id) {
            self.displayed = None;
            self.effects.push(Effect::CalibrateDisplay { unit_id: None });
        }
        unit
    }

    /// Move a unit and everything it carries to `coordinates`.
    pub(crate) fn set_location_recursive(&mut self, id: UnitId, coordinates: Coordinates) {
        let unit = self.expect_unit_mut(id, "set_location_recursive");
        unit.location = coordinates;
        for sub in unit.sub_mobs() {
            self.set_location_recursive(sub, coordinates);
        }
    }

    /// Append an explanation to this turn's logistics report.
    pub fn record_logistics_incident(&mut self, id: UnitId, kind: IncidentKind, cause: &str) {
        let name = self
            .units
            .get(&id)
            .map_or_else(|| id.to_string(), |u| u.name.clone());
        let explanation = LogisticsIncident::explain(kind, &name, cause);
        tracing::debug!(unit = %id, kind = %kind, "{explanation}");
        self.incidents.push(LogisticsIncident {
            turn: self.turn,
            unit_id: id,
            kind,
            cause: cause.to_string(),
            explanation,
        });
    }

    /// String-keyed entry point; unknown kinds are rejected before anything is recorded.
    pub fn record_logistics_incident_str(
        &mut self,
        id: UnitId,
        kind: &str,
        cause: &str,
    ) -> Result<(), UnitError> {
        let kind = kind
            .parse::<IncidentKind>()
            .map_err(|_| UnitError::InvalidIncidentKind(kind.to_string()))?;
        self.record_logistics_incident(id, kind, cause);
        Ok(())
    }

    pub fn incidents_for_turn(&self, turn: u32) -> impl Iterator<Item = &LogisticsIncident> {
        self.incidents.iter().filter(move |i| i.turn == turn)
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(Rules::default())
    }
}
