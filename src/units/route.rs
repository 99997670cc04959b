//! Automatic shuttle routes: pick up at the first waypoint, drop off at the
//! last, and walk the waypoints in between both ways.

use crate::error::UnitError;
use crate::id::UnitId;
use crate::model::effect::Effect;
use crate::model::item::{ItemKey, QUANTITY_EPSILON};
use crate::model::permission::Permission;
use crate::model::route::RouteStep;
use crate::model::tile::{BuildingKind, Coordinates};
use crate::model::world::World;

impl World {
    /// Append a waypoint. Every waypoint after the first must be adjacent to
    /// the one before it.
    pub fn add_to_automatic_route(
        &mut self,
        id: UnitId,
        coordinates: Coordinates,
    ) -> Result<(), UnitError> {
        let unit = self.require_independent(id)?;
        if let Some(last) = unit.automatic_route.dropoff() {
            if !last.is_adjacent(&coordinates) {
                return Err(UnitError::RouteNotAdjacent {
                    from: last,
                    to: coordinates,
                });
            }
        }
        self.expect_unit_mut(id, "add_to_automatic_route")
            .automatic_route
            .push_waypoint(coordinates);
        Ok(())
    }

    pub fn set_wait_until_full(&mut self, id: UnitId, wait: bool) -> Result<(), UnitError> {
        self.require_independent(id)?;
        self.expect_unit_mut(id, "set_wait_until_full").wait_until_full = wait;
        Ok(())
    }

    /// # Panics
    /// Panics if `id` is not in the registry.
    pub fn clear_automatic_route(&mut self, id: UnitId) {
        self.expect_unit_mut(id, "clear_automatic_route")
            .automatic_route
            .clear();
        if self.displayed == Some(id) {
            self.emit(Effect::CalibrateDisplay { unit_id: Some(id) });
        }
    }

    /// Whether the route's current step can be taken now.
    ///
    /// # Panics
    /// Panics if `id` is not in the registry.
    pub fn can_follow_automatic_route(&self, id: UnitId) -> bool {
        let unit = self.expect_unit(id, "can_follow_automatic_route");
        if !unit.is_independent() {
            return false;
        }
        let Some(step) = unit.automatic_route.current_step() else {
            return false;
        };
        let tile = self.tile(unit.location);
        let station_ok = !unit.get_permission(Permission::Train)
            || tile.is_some_and(|t| t.has_intact_building(BuildingKind::TrainStation));

        match step {
            RouteStep::End => station_ok,
            RouteStep::Start => {
                let worth_it = if !unit.inventory.is_empty() {
                    true
                } else if unit.wait_until_full {
                    unit.inventory_full()
                        || tile.is_some_and(|t| {
                            t.inventory_capacity > 0.0
                                && t.inventory.total() + QUANTITY_EPSILON >= t.inventory_capacity
                        })
                } else {
                    tile.is_some_and(|t| {
                        t.inventory
                            .held_items()
                            .any(|key| *key != ItemKey::ConsumerGoods)
                    })
                };
                worth_it && station_ok
            }
            RouteStep::Waypoint { coordinates } => self.can_move(id, coordinates).is_ok(),
        }
    }

    /// Take as many legal route steps as possible, at most one full cycle.
    /// Returns the number of steps taken.
    ///
    /// # Panics
    /// Panics if `id` is not in the registry.
    pub fn follow_automatic_route(&mut self, id: UnitId) -> usize {
        let cycle = self
            .expect_unit(id, "follow_automatic_route")
            .automatic_route
            .in_progress()
            .len();
        let mut taken = 0;
        while taken < cycle && self.can_follow_automatic_route(id) {
            let route = &self.expect_unit(id, "follow_automatic_route").automatic_route;
            let (Some(step), next) = (route.current_step(), route.next_step()) else {
                break;
            };
            match step {
                RouteStep::Start => self.pick_up_cargo(id),
                RouteStep::End => self.drop_inventory(id),
                RouteStep::Waypoint { coordinates } => {
                    self.move_unit(id, coordinates);
                    if next == Some(RouteStep::End) {
                        self.pick_up_cargo(id);
                    }
                }
            }
            self.expect_unit_mut(id, "follow_automatic_route")
                .automatic_route
                .advance();
            taken += 1;
        }
        if taken > 0 {
            tracing::debug!(unit = %id, steps = taken, "followed automatic route");
        }
        taken
    }

    /// Load everything but consumer goods from the unit's tile, up to its
    /// remaining capacity.
    fn pick_up_cargo(&mut self, id: UnitId) {
        let unit = self.expect_unit(id, "pick_up_cargo");
        let location = unit.location;
        let mut capacity = unit.remaining_capacity();
        let Some(tile) = self.tiles.get_mut(&location) else {
            return;
        };
        let mut loaded = Vec::new();
        for key in tile.held_items() {
            if capacity <= QUANTITY_EPSILON {
                break;
            }
            if key == ItemKey::ConsumerGoods {
                continue;
            }
            let amount = tile.consume_items(&key, capacity);
            capacity -= amount;
            loaded.push((key, amount));
        }
        let unit = self.expect_unit_mut(id, "pick_up_cargo");
        for (key, amount) in loaded {
            unit.inventory.change(&key, amount);
        }
    }
}
