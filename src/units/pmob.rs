//! Behaviour shared by every player-controlled unit: construction, movement,
//! equipment, and the die/fire cascade.

use std::collections::BTreeSet;

use crate::error::{MovementRefusal, UnitError};
use crate::id::UnitId;
use crate::model::effect::{Effect, SoundCue};
use crate::model::item::{Inventory, ItemKey, QUANTITY_EPSILON};
use crate::model::permission::Permission;
use crate::model::route::AutomaticRoute;
use crate::model::tile::{BuildingKind, Coordinates};
use crate::model::unit::{Container, Pmob, UnitKind, UpkeepRecord};
use crate::model::unit_type::UnitType;
use crate::model::world::{DeathCause, World};

/// A fresh unit of `unit_type` at `location` with full movement.
pub(crate) fn new_pmob(id: UnitId, unit_type: &UnitType, location: Coordinates, kind: UnitKind) -> Pmob {
    Pmob {
        id,
        name: unit_type.name.clone(),
        default_name: unit_type.name.clone(),
        unit_type: unit_type.key.clone(),
        location,
        movement_points: unit_type.max_movement_points,
        max_movement_points: unit_type.max_movement_points,
        permissions: unit_type.initial_permissions(),
        inventory: Inventory::new(),
        inventory_capacity: unit_type.inventory_capacity,
        equipment: BTreeSet::new(),
        automatic_route: AutomaticRoute::default(),
        wait_until_full: false,
        upkeep: UpkeepRecord::default(),
        container: None,
        kind,
    }
}

impl World {
    /// Whether `id` may step onto `destination` right now.
    ///
    /// # Panics
    /// Panics if `id` is not in the registry.
    pub fn can_move(&self, id: UnitId, destination: Coordinates) -> Result<(), MovementRefusal> {
        let unit = self.expect_unit(id, "can_move");
        if !unit.is_independent() {
            return Err(MovementRefusal::Attached);
        }
        if let UnitKind::Vehicle(v) = &unit.kind {
            if v.crew.is_none() {
                return Err(MovementRefusal::NoCrew);
            }
            if v.crew_replacing {
                return Err(MovementRefusal::CrewBeingReplaced);
            }
        }
        if !unit.location.is_adjacent(&destination) {
            return Err(MovementRefusal::NotAdjacent);
        }
        let tile = self.tile(destination);
        if unit.get_permission(Permission::Train)
            && !tile.is_some_and(|t| t.has_intact_building(BuildingKind::Railroad))
        {
            return Err(MovementRefusal::NoRailroad);
        }
        let cost = tile.map_or(1.0, |t| t.movement_cost);
        // A unit with full movement may always take one step.
        let full = unit.movement_points >= unit.max_movement_points - QUANTITY_EPSILON;
        if unit.movement_points <= QUANTITY_EPSILON
            || (unit.movement_points + QUANTITY_EPSILON < cost && !full)
        {
            return Err(MovementRefusal::OutOfMovement);
        }
        Ok(())
    }

    /// Step `id` onto an adjacent tile. A refused move emits a notification
    /// and returns false.
    ///
    /// # Panics
    /// Panics if `id` is not in the registry.
    pub fn move_unit(&mut self, id: UnitId, destination: Coordinates) -> bool {
        if let Err(refusal) = self.can_move(id, destination) {
            tracing::debug!(unit = %id, to = %destination, ?refusal, "move refused");
            self.notify(refusal.to_string());
            return false;
        }
        let cost = self.tile(destination).map_or(1.0, |t| t.movement_cost);
        let unit = self.expect_unit_mut(id, "move_unit");
        unit.movement_points = (unit.movement_points - cost).max(0.0);
        self.set_location_recursive(id, destination);
        if self.displayed == Some(id) {
            self.emit(Effect::CalibrateDisplay { unit_id: Some(id) });
        }
        true
    }

    /// Flip sentry mode, returning the new state.
    pub fn toggle_sentry_mode(&mut self, id: UnitId) -> Result<bool, UnitError> {
        let sentried = self.require_independent(id)?.get_permission(Permission::SentryMode);
        let value = if sentried { None } else { Some(true) };
        self.set_permission(id, Permission::SentryMode, value, false, true);
        Ok(!sentried)
    }

    /// Start-of-turn movement reset. Disorganized units recover half their
    /// movement and lose the flag.
    pub fn refresh_movement(&mut self, id: UnitId) {
        let unit = self.expect_unit_mut(id, "refresh_movement");
        if unit.get_permission(Permission::Disorganized) {
            unit.movement_points = (unit.max_movement_points / 2.0).floor();
            self.set_permission(id, Permission::Disorganized, None, false, true);
        } else {
            unit.movement_points = unit.max_movement_points;
        }
    }

    /// Equip one `item` from the unit's tile.
    pub fn equip(&mut self, id: UnitId, item: &ItemKey) -> Result<(), UnitError> {
        let unit = self.require_independent(id)?;
        let location = unit.location;
        let equippable = self
            .rules
            .equipment_type(item)
            .is_some_and(|eq| eq.can_equip(&unit.permissions));
        if !equippable || unit.equipment.contains(item) {
            return Err(UnitError::CannotEquip {
                id,
                item: item.clone(),
            });
        }
        if self.tile(location).map_or(0.0, |t| t.get_inventory(item)) + QUANTITY_EPSILON < 1.0 {
            return Err(UnitError::ItemUnavailable {
                item: item.clone(),
                location,
            });
        }

        self.tile_mut(location).change_inventory(item, -1.0);
        self.expect_unit_mut(id, "equip").equipment.insert(item.clone());
        self.set_equipment_grants(id, item, true);
        tracing::debug!(unit = %id, %item, "equipped");
        Ok(())
    }

    /// Return an equipped item to the unit's tile.
    pub fn unequip(&mut self, id: UnitId, item: &ItemKey) -> Result<(), UnitError> {
        let unit = self.require_independent(id)?;
        if !unit.equipment.contains(item) {
            return Err(UnitError::NotEquipped {
                id,
                item: item.clone(),
            });
        }
        let location = unit.location;
        self.expect_unit_mut(id, "unequip").equipment.remove(item);
        self.set_equipment_grants(id, item, false);
        self.tile_mut(location).change_inventory(item, 1.0);
        Ok(())
    }

    /// Equipment grants live in the override layer so removing them never
    /// erases a capability the unit has on its own.
    pub(crate) fn set_equipment_grants(&mut self, id: UnitId, item: &ItemKey, equipped: bool) {
        let grants = self
            .rules
            .equipment_type(item)
            .map(|eq| eq.grants.clone())
            .unwrap_or_default();
        let value = if equipped { Some(true) } else { None };
        for grant in grants {
            self.set_permission(id, grant, value, true, true);
        }
    }

    /// Drop everything `id` carries onto its tile.
    pub(crate) fn drop_inventory(&mut self, id: UnitId) {
        let unit = self.expect_unit_mut(id, "drop_inventory");
        let location = unit.location;
        let dropped = unit.inventory.drain();
        self.tile_mut(location).inventory.absorb(dropped);
    }

    /// Kill a unit and cascade through its containers and sub-mobs.
    /// Already-removed ids are ignored.
    pub fn die(&mut self, id: UnitId, cause: DeathCause) {
        if !self.is_alive(id) {
            return;
        }
        tracing::info!(unit = %id, cause = %cause, "unit died");
        if cause != DeathCause::Fired {
            self.emit(Effect::Sound {
                cue: SoundCue::Death,
            });
        }
        self.die_cascade(id, cause);
    }

    fn die_cascade(&mut self, id: UnitId, cause: DeathCause) {
        let Some(unit) = self.units.get(&id) else {
            return;
        };
        let container = unit.container;

        // An embarked group losing one member puts the survivor back aboard.
        let mut reembark = None;
        match container {
            Some(Container::InGroup { group }) => {
                let group_unit = self.expect_unit(group, "die");
                if let (Some(Container::Passenger { vehicle }), Some(data)) =
                    (group_unit.container, group_unit.kind.as_group())
                {
                    let survivor = if data.worker == id {
                        data.officer
                    } else {
                        data.worker
                    };
                    reembark = Some((survivor, vehicle));
                }
                self.disband_members(group, false);
            }
            Some(Container::Crewing { vehicle }) => {
                self.detach_crew(vehicle, false);
            }
            Some(Container::Passenger { vehicle }) => {
                self.detach_passenger(vehicle, id, false, false);
            }
            None => {}
        }

        let kind = self.expect_unit(id, "die").kind.clone();
        match kind {
            UnitKind::Group(group) => {
                self.disband_members(id, false);
                self.die_cascade(group.worker, cause);
                self.die_cascade(group.officer, cause);
            }
            UnitKind::Vehicle(_) => {
                self.eject_passengers(id, false);
                self.eject_crew(id, false);
                self.drop_inventory(id);
                self.remove_unit(id);
            }
            UnitKind::Worker(_) | UnitKind::Officer(_) => {
                self.drop_inventory(id);
                self.remove_unit(id);
            }
        }

        if let Some((survivor, vehicle)) = reembark {
            if self.is_alive(survivor) && self.is_alive(vehicle) {
                tracing::debug!(unit = %survivor, vehicle = %vehicle, "reembarking survivor");
                self.attach_passenger(vehicle, survivor);
            }
        }
    }

    /// Dismiss a unit. Composites dismiss everything they hold.
    pub fn fire(&mut self, id: UnitId) {
        let Some(unit) = self.units.get(&id) else {
            return;
        };
        let container = unit.container;
        let sub_mobs = unit.sub_mobs();
        match unit.kind.clone() {
            UnitKind::Group(group) => {
                if let Some(Container::Passenger { vehicle }) = container {
                    self.detach_passenger(vehicle, id, false, false);
                }
                self.disband_members(id, false);
                self.fire(group.worker);
                self.fire(group.officer);
            }
            UnitKind::Vehicle(_) => {
                for sub in sub_mobs {
                    self.fire(sub);
                }
                self.die(id, DeathCause::Fired);
            }
            UnitKind::Worker(_) | UnitKind::Officer(_) => self.die(id, DeathCause::Fired),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::save::UnitInit;
    use crate::model::tile::{Grid, Tile};
    use crate::testutil::{officer_at, seeded_rng, surface, worker_at};

    #[test]
    fn move_costs_tile_movement() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let worker = worker_at(&mut world, &mut rng, surface(0, 0));
        let mut rough = Tile::new(surface(1, 0));
        rough.movement_cost = 2.0;
        world.add_tile(rough);

        assert!(world.move_unit(worker, surface(1, 0)));
        let unit = world.unit(worker).unwrap();
        assert_eq!(unit.location, surface(1, 0));
        assert_eq!(unit.movement_points, 2.0);
    }

    #[test]
    fn refused_move_notifies_and_keeps_state() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let worker = worker_at(&mut world, &mut rng, surface(0, 0));

        assert!(!world.move_unit(worker, surface(2, 0)));
        assert_eq!(world.unit(worker).unwrap().location, surface(0, 0));
        assert_eq!(
            world.drain_effects(),
            vec![Effect::notification(MovementRefusal::NotAdjacent.to_string())]
        );
    }

    #[test]
    fn trains_need_railroad() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let crew = worker_at(&mut world, &mut rng, surface(0, 0));
        let train = world
            .create_unit(
                UnitInit::Vehicle {
                    unit_type: "train".to_string(),
                    location: surface(0, 0),
                    crew: Some(crew),
                },
                &mut rng,
            )
            .unwrap();
        assert_eq!(world.can_move(train, surface(0, 1)), Err(MovementRefusal::NoRailroad));
        world.add_tile(Tile::new(surface(0, 1)).with_building(BuildingKind::Railroad));
        assert_eq!(world.can_move(train, surface(0, 1)), Ok(()));
    }

    #[test]
    fn sentry_toggle_leaves_and_rejoins_queue() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let worker = worker_at(&mut world, &mut rng, surface(0, 0));
        assert_eq!(world.toggle_sentry_mode(worker), Ok(true));
        assert!(world.turn_queue().is_empty());
        assert_eq!(world.toggle_sentry_mode(worker), Ok(false));
        assert_eq!(world.turn_queue(), vec![worker]);
    }

    #[test]
    fn disorganized_units_recover_half_movement() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let worker = worker_at(&mut world, &mut rng, surface(0, 0));
        world.unit_mut(worker).unwrap().movement_points = 0.0;
        world.set_permission(worker, Permission::Disorganized, Some(true), false, true);

        world.refresh_movement(worker);
        let unit = world.unit(worker).unwrap();
        assert_eq!(unit.movement_points, 2.0);
        assert!(!unit.get_permission(Permission::Disorganized));

        world.refresh_movement(worker);
        assert_eq!(world.unit(worker).unwrap().movement_points, 4.0);
    }

    #[test]
    fn equipment_grants_survive_as_overrides() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let officer = officer_at(&mut world, &mut rng, "explorer", surface(0, 0));
        let suits = ItemKey::from("spacesuits");
        assert!(matches!(
            world.equip(officer, &suits),
            Err(UnitError::ItemUnavailable { .. })
        ));

        world.tile_mut(surface(0, 0)).change_inventory(&suits, 1.0);
        world.equip(officer, &suits).unwrap();
        let unit = world.unit(officer).unwrap();
        assert!(unit.get_permission(Permission::Survivable));
        assert!(unit.permissions.has_override(Permission::Survivable));
        assert_eq!(world.tile(surface(0, 0)).unwrap().get_inventory(&suits), 0.0);

        world.unequip(officer, &suits).unwrap();
        assert!(!world.unit(officer).unwrap().get_permission(Permission::Survivable));
        assert_eq!(world.tile(surface(0, 0)).unwrap().get_inventory(&suits), 1.0);
    }

    #[test]
    fn pack_saddles_need_porters() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let worker = worker_at(&mut world, &mut rng, surface(0, 0));
        let saddles = ItemKey::from("pack_saddles");
        world.tile_mut(surface(0, 0)).change_inventory(&saddles, 1.0);
        assert!(matches!(
            world.equip(worker, &saddles),
            Err(UnitError::CannotEquip { .. })
        ));
    }

    #[test]
    fn dead_leaf_drops_cargo_and_leaves_registry() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let worker = worker_at(&mut world, &mut rng, surface(0, 0));
        world
            .unit_mut(worker)
            .unwrap()
            .inventory
            .change(&ItemKey::Food, 2.0);

        world.die(worker, DeathCause::Killed);
        assert!(!world.is_alive(worker));
        assert_eq!(
            world.tile(surface(0, 0)).unwrap().get_inventory(&ItemKey::Food),
            2.0
        );
        assert!(world.drain_effects().contains(&Effect::Sound {
            cue: SoundCue::Death
        }));
        // Second call is ignored.
        world.die(worker, DeathCause::Killed);
    }

    #[test]
    fn home_grid_units_move_on_earth() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let home = Coordinates::new(Grid::Earth, 0, 0);
        let worker = worker_at(&mut world, &mut rng, home);
        assert!(world.move_unit(worker, Coordinates::new(Grid::Earth, 0, 1)));
        assert!(!world.move_unit(worker, Coordinates::new(Grid::Surface, 0, 2)));
    }
}
