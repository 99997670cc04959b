//! End-of-turn item upkeep: availability snapshot, consumption and penalties.

use std::collections::{BTreeMap, BTreeSet};

use crate::id::UnitId;
use crate::model::effect::IncidentKind;
use crate::model::item::{ItemKey, QUANTITY_EPSILON, UpkeepPenalty};
use crate::model::permission::Permission;
use crate::model::tile::{Coordinates, Grid, Habitability};
use crate::model::unit::UpkeepRecord;
use crate::model::world::{DeathCause, World};

/// Status flag a penalty leaves behind, if it is a lasting condition.
fn penalty_status(penalty: UpkeepPenalty) -> Option<Permission> {
    match penalty {
        UpkeepPenalty::Starvation => Some(Permission::Starvation),
        UpkeepPenalty::Dehydration => Some(Permission::Dehydration),
        _ => None,
    }
}

impl World {
    /// Items `id` needs this turn, keyed by item.
    ///
    /// Empty on the home grid when `earth_exemption` is set. Air is only
    /// required on deadly tiles. With `recurse`, sub-mob upkeep is summed in.
    ///
    /// # Panics
    /// Panics if `id` is not in the registry.
    pub fn get_item_upkeep(
        &self,
        id: UnitId,
        recurse: bool,
        earth_exemption: bool,
    ) -> BTreeMap<ItemKey, f64> {
        let unit = self.expect_unit(id, "get_item_upkeep");
        let mut upkeep = BTreeMap::new();
        if earth_exemption && unit.location.grid == Grid::Earth {
            return upkeep;
        }
        let breathable = self
            .tile(unit.location)
            .map_or(Habitability::Perfect, |t| t.habitability)
            > Habitability::Deadly;
        if let Some(unit_type) = self.rules.unit_type(&unit.unit_type) {
            for (key, amount) in &unit_type.upkeep {
                if *key == ItemKey::Air && breathable {
                    continue;
                }
                *upkeep.entry(key.clone()).or_insert(0.0) += amount;
            }
        }
        if recurse {
            for sub in unit.sub_mobs() {
                for (key, amount) in self.get_item_upkeep(sub, true, earth_exemption) {
                    *upkeep.entry(key).or_insert(0.0) += amount;
                }
            }
        }
        upkeep
    }

    /// Every item present at `location`, on the tile or carried by any unit there.
    pub fn available_items_at(&self, location: Coordinates) -> BTreeSet<ItemKey> {
        let mut items: BTreeSet<ItemKey> = self
            .tile(location)
            .map(|t| t.held_items().into_iter().collect())
            .unwrap_or_default();
        for unit in self.units.values().filter(|u| u.location == location) {
            items.extend(unit.inventory.held_items().cloned());
        }
        items
    }

    /// Pay `id`'s own upkeep, then its sub-mobs'.
    ///
    /// Items come from the unit's own inventory, then its tile, then other
    /// units on the tile. Keys missing from `available` count as missing
    /// whatever was consumed. The worst missing penalty is recorded for
    /// [`World::resolve_upkeep_missing_penalty`].
    ///
    /// # Panics
    /// Panics if `id` is not in the registry.
    pub fn consume_item_upkeep(&mut self, id: UnitId, available: &BTreeSet<ItemKey>) {
        let location = self.expect_unit(id, "consume_item_upkeep").location;
        let mut record = UpkeepRecord::default();

        // Nothing is spent on a unit the environment is about to kill.
        if self.experienced_habitability(id) != Habitability::Deadly {
            let demand = self.get_item_upkeep(id, false, true);
            let mut missing = Vec::new();
            let mut satisfied = Vec::new();
            for (key, amount) in demand {
                let unmet = self.drain_upkeep_item(id, location, &key, amount);
                if unmet > QUANTITY_EPSILON || !available.contains(&key) {
                    missing.push(key);
                } else {
                    satisfied.push(key);
                }
            }

            let unit = self.expect_unit(id, "consume_item_upkeep");
            for key in missing {
                let mut penalty = self.rules.item_penalty(&key);
                if penalty_status(penalty).is_some_and(|status| unit.get_permission(status)) {
                    penalty = UpkeepPenalty::Death;
                }
                if penalty > record.penalty {
                    record.penalty = penalty;
                    record.missing_item = Some(key);
                }
            }

            for key in satisfied {
                if let Some(status) = penalty_status(self.rules.item_penalty(&key)) {
                    self.set_permission(id, status, None, false, true);
                }
            }
        }

        let unit = self.expect_unit_mut(id, "consume_item_upkeep");
        unit.upkeep = record;
        for sub in unit.sub_mobs() {
            self.consume_item_upkeep(sub, available);
        }
    }

    /// Take up to `amount` of `key` for `id`, returning what could not be found.
    fn drain_upkeep_item(
        &mut self,
        id: UnitId,
        location: Coordinates,
        key: &ItemKey,
        amount: f64,
    ) -> f64 {
        let mut remaining = amount;
        remaining -= self
            .expect_unit_mut(id, "consume_item_upkeep")
            .inventory
            .take(key, remaining);
        if remaining > QUANTITY_EPSILON {
            if let Some(tile) = self.tiles.get_mut(&location) {
                remaining -= tile.consume_items(key, remaining);
            }
        }
        for (other_id, other) in self.units.iter_mut() {
            if remaining <= QUANTITY_EPSILON {
                break;
            }
            if *other_id != id && other.location == location {
                remaining -= other.inventory.take(key, remaining);
            }
        }
        remaining.max(0.0)
    }

    /// Apply the penalty recorded by the last consume pass to `id` and its
    /// sub-mobs. Sub-mobs that outlive their holder's death, such as ejected
    /// passengers, still settle their own records.
    ///
    /// # Panics
    /// Panics if `id` is not in the registry.
    pub fn resolve_upkeep_missing_penalty(&mut self, id: UnitId) {
        let unit = self.expect_unit_mut(id, "resolve_upkeep_missing_penalty");
        let record = std::mem::take(&mut unit.upkeep);
        let sub_mobs = unit.sub_mobs();
        let cause = record
            .missing_item
            .as_ref()
            .map_or_else(String::new, |key| self.rules.item_name(key));

        match record.penalty {
            UpkeepPenalty::Death => {
                self.record_logistics_incident(id, IncidentKind::Death, &format!("lack of {cause}"));
                self.die(id, DeathCause::Upkeep);
            }
            UpkeepPenalty::Starvation => {
                self.set_permission(id, Permission::Starvation, Some(true), false, true);
                self.record_logistics_incident(id, IncidentKind::Starvation, &cause);
            }
            UpkeepPenalty::Dehydration => {
                self.set_permission(id, Permission::Dehydration, Some(true), false, true);
                self.record_logistics_incident(id, IncidentKind::Dehydration, &cause);
            }
            UpkeepPenalty::Morale => {
                self.set_permission(id, Permission::Disorganized, Some(true), false, true);
                self.record_logistics_incident(id, IncidentKind::Morale, &cause);
            }
            UpkeepPenalty::None => {}
        }

        for sub in sub_mobs {
            if self.is_alive(sub) {
                self.resolve_upkeep_missing_penalty(sub);
            }
        }
    }

    /// The three upkeep passes for every independent unit, in order:
    /// availability snapshot, consumption, penalties. Returns the units that
    /// died.
    pub fn resolve_turn_upkeep(&mut self) -> Vec<UnitId> {
        let before: BTreeSet<UnitId> = self.units.keys().copied().collect();
        let roots = self.independent_units();

        let mut available: BTreeMap<Coordinates, BTreeSet<ItemKey>> = BTreeMap::new();
        for id in &roots {
            let location = self.expect_unit(*id, "resolve_turn_upkeep").location;
            if !available.contains_key(&location) {
                available.insert(location, self.available_items_at(location));
            }
        }

        for id in &roots {
            let location = self.expect_unit(*id, "resolve_turn_upkeep").location;
            if let Some(items) = available.get(&location) {
                self.consume_item_upkeep(*id, items);
            }
        }
        for id in roots {
            if self.is_alive(id) {
                self.resolve_upkeep_missing_penalty(id);
            }
        }

        let dead: Vec<UnitId> = before
            .into_iter()
            .filter(|id| !self.is_alive(*id))
            .collect();
        tracing::info!(turn = self.turn, deaths = dead.len(), "upkeep resolved");
        dead
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tile::Tile;
    use crate::rules::Rules;
    use crate::testutil::{crewed_vehicle, group_at, officer_at, seeded_rng, surface, worker_at};

    fn stock(world: &mut World, at: Coordinates, items: &[(ItemKey, f64)]) {
        for (key, amount) in items {
            world.tile_mut(at).change_inventory(key, *amount);
        }
    }

    #[test]
    fn home_grid_is_exempt() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let home = Coordinates::new(Grid::Earth, 0, 0);
        let worker = worker_at(&mut world, &mut rng, home);
        assert!(world.get_item_upkeep(worker, false, true).is_empty());
        assert!(!world.get_item_upkeep(worker, false, false).is_empty());
    }

    #[test]
    fn air_only_needed_on_deadly_tiles() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let worker = worker_at(&mut world, &mut rng, surface(0, 0));
        assert!(!world.get_item_upkeep(worker, false, true).contains_key(&ItemKey::Air));

        world.add_tile(Tile::new(surface(1, 1)).with_habitability(Habitability::Deadly));
        let exposed = worker_at(&mut world, &mut rng, surface(1, 1));
        assert_eq!(world.get_item_upkeep(exposed, false, true)[&ItemKey::Air], 1.0);
    }

    #[test]
    fn recursive_upkeep_sums_members() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let (group, _, _) = group_at(&mut world, &mut rng, "explorer", surface(0, 0));
        let upkeep = world.get_item_upkeep(group, true, true);
        assert_eq!(upkeep[&ItemKey::Food], 2.0);
        assert_eq!(upkeep[&ItemKey::ConsumerGoods], 0.5);
        assert!(world.get_item_upkeep(group, false, true).is_empty());
    }

    #[test]
    fn worst_missing_penalty_wins() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let officer = officer_at(&mut world, &mut rng, "explorer", surface(0, 0));
        world.consume_item_upkeep(officer, &BTreeSet::new());
        let record = &world.unit(officer).unwrap().upkeep;
        assert_eq!(record.penalty, UpkeepPenalty::Dehydration);
        assert_eq!(record.missing_item, Some(ItemKey::Water));
    }

    #[test]
    fn recurring_starvation_escalates_to_death() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let worker = worker_at(&mut world, &mut rng, surface(0, 0));
        stock(&mut world, surface(0, 0), &[(ItemKey::Water, 5.0)]);

        world.resolve_turn_upkeep();
        assert!(world.unit(worker).unwrap().get_permission(Permission::Starvation));

        let dead = world.resolve_turn_upkeep();
        assert_eq!(dead, vec![worker]);
        let kinds: Vec<_> = world.incidents.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IncidentKind::Starvation, IncidentKind::Death]);
        assert_eq!(
            world.incidents[1].explanation,
            "European workers died from lack of food."
        );
    }

    #[test]
    fn satisfied_need_clears_status() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let worker = worker_at(&mut world, &mut rng, surface(0, 0));
        world.set_permission(worker, Permission::Starvation, Some(true), false, true);
        stock(&mut world, surface(0, 0), &[(ItemKey::Food, 1.0), (ItemKey::Water, 1.0)]);

        let dead = world.resolve_turn_upkeep();
        assert!(dead.is_empty());
        assert!(!world.unit(worker).unwrap().get_permission(Permission::Starvation));
        assert!(world.tile(surface(0, 0)).unwrap().inventory.is_empty());
    }

    #[test]
    fn drains_own_inventory_then_tile_then_neighbours() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let at = surface(0, 0);
        let worker = worker_at(&mut world, &mut rng, at);
        let neighbour = worker_at(&mut world, &mut rng, at);
        world.unit_mut(worker).unwrap().inventory.change(&ItemKey::Food, 0.5);
        world.unit_mut(neighbour).unwrap().inventory.change(&ItemKey::Water, 3.0);
        stock(&mut world, at, &[(ItemKey::Food, 0.25), (ItemKey::Water, 0.5)]);

        let available = world.available_items_at(at);
        world.consume_item_upkeep(worker, &available);

        assert_eq!(world.unit(worker).unwrap().upkeep.missing_item, Some(ItemKey::Food));
        assert!(world.unit(worker).unwrap().inventory.is_empty());
        assert!(world.tile(at).unwrap().inventory.is_empty());
        assert_eq!(world.unit(neighbour).unwrap().inventory.get(&ItemKey::Water), 2.5);
    }

    #[test]
    fn deadly_environment_wastes_nothing() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let at = surface(4, 4);
        world.add_tile(Tile::new(at).with_habitability(Habitability::Deadly));
        let worker = worker_at(&mut world, &mut rng, at);
        world.unit_mut(worker).unwrap().inventory.change(&ItemKey::Food, 1.0);

        let available = world.available_items_at(at);
        world.consume_item_upkeep(worker, &available);
        let unit = world.unit(worker).unwrap();
        assert_eq!(unit.inventory.get(&ItemKey::Food), 1.0);
        assert_eq!(unit.upkeep, UpkeepRecord::default());
    }

    #[test]
    fn missing_consumer_goods_disorganize() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let officer = officer_at(&mut world, &mut rng, "explorer", surface(0, 0));
        stock(&mut world, surface(0, 0), &[(ItemKey::Food, 1.0), (ItemKey::Water, 1.0)]);

        world.resolve_turn_upkeep();
        let unit = world.unit(officer).unwrap();
        assert!(unit.get_permission(Permission::Disorganized));
        assert_eq!(world.incidents[0].kind, IncidentKind::Morale);
        assert_eq!(
            world.incidents[0].explanation,
            format!("{} lost morale after going without consumer goods.", unit.name)
        );
    }

    #[test]
    fn group_member_death_leaves_survivor() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let (group, worker, officer) = group_at(&mut world, &mut rng, "explorer", surface(0, 0));
        world.set_permission(worker, Permission::Dehydration, Some(true), false, true);
        stock(
            &mut world,
            surface(0, 0),
            &[(ItemKey::Food, 2.0), (ItemKey::ConsumerGoods, 1.0)],
        );

        let dead = world.resolve_turn_upkeep();
        assert!(dead.contains(&group));
        assert!(dead.contains(&worker));
        let survivor = world.unit(officer).unwrap();
        assert!(survivor.is_independent());
        assert!(survivor.get_permission(Permission::Dehydration));
    }

    #[test]
    fn suited_group_members_still_consume() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let at = surface(2, 2);
        world.add_tile(Tile::new(at).with_habitability(Habitability::Deadly));
        let (group, worker, officer) = group_at(&mut world, &mut rng, "explorer", at);
        let suits = ItemKey::from("spacesuits");
        stock(&mut world, at, &[(suits.clone(), 1.0)]);
        world.equip(group, &suits).unwrap();
        assert_eq!(world.experienced_habitability(worker), Habitability::Hostile);
        stock(
            &mut world,
            at,
            &[
                (ItemKey::Food, 10.0),
                (ItemKey::Water, 10.0),
                (ItemKey::Air, 10.0),
                (ItemKey::ConsumerGoods, 1.0),
            ],
        );

        let dead = world.resolve_turn_upkeep();
        assert!(dead.is_empty());
        let tile = world.tile(at).unwrap();
        assert_eq!(tile.get_inventory(&ItemKey::Food), 8.0);
        assert_eq!(tile.get_inventory(&ItemKey::Water), 8.0);
        assert_eq!(tile.get_inventory(&ItemKey::Air), 8.0);
        assert_eq!(tile.get_inventory(&ItemKey::ConsumerGoods), 0.5);
        assert!(world.is_alive(officer));
    }

    #[test]
    fn passengers_settle_upkeep_after_vehicle_dies() {
        let mut rules = Rules::default();
        for item in rules.item_types.iter_mut() {
            if item.key == ItemKey::Fuel {
                item.upkeep_penalty = UpkeepPenalty::Death;
            }
        }
        let mut world = World::new(rules);
        let mut rng = seeded_rng();
        let at = surface(0, 0);
        let (ship, crew) = crewed_vehicle(&mut world, &mut rng, "steamship", at);
        let passenger = worker_at(&mut world, &mut rng, at);
        world.embark(ship, passenger).unwrap();
        world.set_permission(passenger, Permission::Dehydration, Some(true), false, true);
        stock(&mut world, at, &[(ItemKey::Food, 2.0)]);

        let dead = world.resolve_turn_upkeep();
        assert!(dead.contains(&ship));
        assert!(dead.contains(&passenger));
        let survivor = world.unit(crew).unwrap();
        assert!(survivor.is_independent());
        assert!(survivor.get_permission(Permission::Dehydration));
        assert_eq!(survivor.upkeep, UpkeepRecord::default());
    }
}
