use crate::error::UnitError;
use crate::id::UnitId;
use crate::model::effect::{Effect, SoundCue};
use crate::model::permission::Permission;
use crate::model::unit::Container;
use crate::model::unit_type::UnitClass;
use crate::model::world::World;

impl World {
    /// Replace a vehicle's crew slot and flip everything that depends on it.
    /// Setting the crew it already has changes nothing.
    ///
    /// # Panics
    /// Panics if `vehicle` is not a live vehicle.
    pub fn set_crew(&mut self, vehicle: UnitId, new_crew: Option<UnitId>) {
        let rated_capacity = {
            let unit = self.expect_unit(vehicle, "set_crew");
            self.rules
                .unit_type(&unit.unit_type)
                .map_or(0.0, |t| t.inventory_capacity)
        };
        let unit = self.expect_unit_mut(vehicle, "set_crew");
        let data = unit
            .kind
            .as_vehicle_mut()
            .unwrap_or_else(|| panic!("set_crew: unit {vehicle} is not a vehicle"));
        if data.crew == new_crew {
            return;
        }
        data.crew = new_crew;
        let crewed = new_crew.is_some();
        unit.inventory_capacity = if crewed { rated_capacity } else { 0.0 };

        self.set_permission(vehicle, Permission::Active, Some(crewed), false, true);
        self.set_permission(vehicle, Permission::ActiveVehicle, Some(crewed), false, true);
        self.set_permission(vehicle, Permission::InactiveVehicle, Some(!crewed), false, true);
        self.set_permission(vehicle, Permission::SentryMode, None, false, true);
        if !crewed {
            self.drop_inventory(vehicle);
        }
        tracing::debug!(vehicle = %vehicle, crew = ?new_crew, "crew changed");
    }

    /// Put an independent worker in charge of an uncrewed vehicle on its tile.
    pub fn crew_vehicle(&mut self, vehicle: UnitId, worker: UnitId) -> Result<(), UnitError> {
        let data = self
            .require_class(vehicle, UnitClass::Vehicle)?
            .kind
            .as_vehicle()
            .cloned()
            .unwrap_or_default();
        self.require_class(worker, UnitClass::Worker)?;
        self.require_independent(vehicle)?;
        self.require_independent(worker)?;
        self.require_colocated(vehicle, worker)?;
        if data.crew.is_some() {
            return Err(UnitError::AlreadyCrewed(vehicle));
        }

        self.attach_crew(vehicle, worker);
        self.emit(Effect::Sound {
            cue: SoundCue::Crew,
        });
        if self.displayed == Some(worker) {
            self.select(vehicle);
        }
        tracing::info!(vehicle = %vehicle, worker = %worker, "vehicle crewed");
        Ok(())
    }

    /// Release an empty vehicle's crew. Returns the released worker.
    pub fn uncrew_vehicle(&mut self, vehicle: UnitId, focus: bool) -> Result<UnitId, UnitError> {
        let data = self
            .require_class(vehicle, UnitClass::Vehicle)?
            .kind
            .as_vehicle()
            .cloned()
            .unwrap_or_default();
        if !data.passengers.is_empty() {
            return Err(UnitError::HasPassengers(vehicle));
        }
        if data.crew.is_none() {
            return Err(UnitError::NoCrew(vehicle));
        }

        let worker = self
            .detach_crew(vehicle, focus)
            .ok_or(UnitError::NoCrew(vehicle))?;
        self.emit(Effect::Sound {
            cue: SoundCue::Uncrew,
        });
        tracing::info!(vehicle = %vehicle, worker = %worker, "vehicle uncrewed");
        Ok(worker)
    }

    /// Board an independent non-vehicle unit onto a crewed vehicle on its tile.
    pub fn embark(&mut self, vehicle: UnitId, passenger: UnitId) -> Result<(), UnitError> {
        let crewed = self
            .require_class(vehicle, UnitClass::Vehicle)?
            .kind
            .as_vehicle()
            .is_some_and(|v| v.crew.is_some());
        if self.require_independent(passenger)?.class() == UnitClass::Vehicle {
            return Err(UnitError::CannotBoard(passenger));
        }
        self.require_independent(vehicle)?;
        self.require_colocated(vehicle, passenger)?;
        if !crewed {
            return Err(UnitError::NoCrew(vehicle));
        }

        self.attach_passenger(vehicle, passenger);
        self.emit(Effect::Sound {
            cue: SoundCue::Embark,
        });
        if self.displayed == Some(passenger) {
            self.select(vehicle);
        }
        tracing::info!(vehicle = %vehicle, unit = %passenger, "embarked");
        Ok(())
    }

    /// Let a passenger off. Without the vehicle's supporting building on the
    /// tile the passenger lands disorganized.
    pub fn disembark(
        &mut self,
        vehicle: UnitId,
        passenger: UnitId,
        focus: bool,
    ) -> Result<(), UnitError> {
        let aboard = self
            .require_class(vehicle, UnitClass::Vehicle)?
            .kind
            .as_vehicle()
            .is_some_and(|v| v.passengers.contains(&passenger));
        if !aboard {
            return Err(UnitError::NotAboard {
                vehicle,
                unit: passenger,
            });
        }

        self.detach_passenger(vehicle, passenger, focus, true);
        self.emit(Effect::Sound {
            cue: SoundCue::Disembark,
        });
        tracing::info!(vehicle = %vehicle, unit = %passenger, "disembarked");
        Ok(())
    }

    /// Force the crew out, remembering it for `reembark`.
    pub fn eject_crew(&mut self, vehicle: UnitId, focus: bool) -> Option<UnitId> {
        let crew = self.detach_crew(vehicle, focus)?;
        if let Some(data) = self
            .expect_unit_mut(vehicle, "eject_crew")
            .kind
            .as_vehicle_mut()
        {
            data.ejected_crew = Some(crew);
        }
        Some(crew)
    }

    /// Force every passenger out, front first. Only the last one ejected
    /// receives focus.
    pub fn eject_passengers(&mut self, vehicle: UnitId, focus: bool) -> Vec<UnitId> {
        let mut ejected = Vec::new();
        loop {
            let data = self
                .expect_unit(vehicle, "eject_passengers")
                .kind
                .as_vehicle()
                .unwrap_or_else(|| panic!("eject_passengers: unit {vehicle} is not a vehicle"));
            let Some(&next) = data.passengers.first() else {
                break;
            };
            let last = data.passengers.len() == 1;
            self.detach_passenger(vehicle, next, focus && last, true);
            ejected.push(next);
        }
        if let Some(data) = self
            .expect_unit_mut(vehicle, "eject_passengers")
            .kind
            .as_vehicle_mut()
        {
            data.ejected_passengers = ejected.clone();
        }
        ejected
    }

    /// Put previously ejected units back aboard, skipping any that died or
    /// joined something else since. Returns the units restored.
    pub fn reembark(&mut self, vehicle: UnitId) -> Vec<UnitId> {
        let Some(data) = self
            .units
            .get_mut(&vehicle)
            .and_then(|u| u.kind.as_vehicle_mut())
        else {
            return Vec::new();
        };
        let ejected_crew = data.ejected_crew.take();
        let ejected_passengers = std::mem::take(&mut data.ejected_passengers);
        let has_crew = data.crew.is_some();
        let location = self.expect_unit(vehicle, "reembark").location;

        let mut restored = Vec::new();
        if let Some(crew) = ejected_crew {
            if !has_crew && self.units.get(&crew).is_some_and(|u| u.is_independent()) {
                self.set_location_recursive(crew, location);
                self.attach_crew(vehicle, crew);
                restored.push(crew);
            }
        }
        for passenger in ejected_passengers {
            if self
                .units
                .get(&passenger)
                .is_some_and(|u| u.is_independent())
            {
                self.set_location_recursive(passenger, location);
                self.attach_passenger(vehicle, passenger);
                restored.push(passenger);
            }
        }
        tracing::debug!(vehicle = %vehicle, restored = restored.len(), "reembarked");
        restored
    }

    pub(crate) fn attach_crew(&mut self, vehicle: UnitId, worker: UnitId) {
        let unit = self.expect_unit_mut(worker, "attach_crew");
        unit.container = Some(Container::Crewing { vehicle });
        self.set_permission(worker, Permission::InVehicle, Some(true), false, false);
        self.set_permission(worker, Permission::SentryMode, None, false, false);
        self.set_crew(vehicle, Some(worker));
    }

    /// Returns the released crew, if there was one.
    pub(crate) fn detach_crew(&mut self, vehicle: UnitId, focus: bool) -> Option<UnitId> {
        let crew = self
            .expect_unit(vehicle, "detach_crew")
            .kind
            .as_vehicle()
            .and_then(|v| v.crew)?;
        self.set_crew(vehicle, None);
        self.expect_unit_mut(crew, "detach_crew").container = None;
        self.set_permission(crew, Permission::InVehicle, None, false, false);
        if focus {
            self.select(crew);
        }
        Some(crew)
    }

    pub(crate) fn attach_passenger(&mut self, vehicle: UnitId, passenger: UnitId) {
        let location = self.expect_unit(vehicle, "attach_passenger").location;
        if let Some(data) = self
            .expect_unit_mut(vehicle, "attach_passenger")
            .kind
            .as_vehicle_mut()
        {
            data.passengers.push(passenger);
        }
        self.expect_unit_mut(passenger, "attach_passenger").container =
            Some(Container::Passenger { vehicle });
        self.set_permission(passenger, Permission::InVehicle, Some(true), false, false);
        self.set_permission(passenger, Permission::SentryMode, None, false, false);
        self.set_location_recursive(passenger, location);
    }

    /// Returns false if `passenger` was not aboard.
    pub(crate) fn detach_passenger(
        &mut self,
        vehicle: UnitId,
        passenger: UnitId,
        focus: bool,
        disorganize: bool,
    ) -> bool {
        let unit = self.expect_unit_mut(vehicle, "detach_passenger");
        let location = unit.location;
        let Some(data) = unit.kind.as_vehicle_mut() else {
            return false;
        };
        let Some(index) = data.passengers.iter().position(|p| *p == passenger) else {
            return false;
        };
        data.passengers.remove(index);
        let building = data.vehicle_kind.and_then(|k| k.supporting_building());

        self.expect_unit_mut(passenger, "detach_passenger").container = None;
        self.set_permission(passenger, Permission::InVehicle, None, false, false);
        let unsupported = building.is_some_and(|b| {
            !self
                .tile(location)
                .is_some_and(|t| t.has_intact_building(b))
        });
        if disorganize && unsupported {
            self.set_permission(passenger, Permission::Disorganized, Some(true), false, true);
        }
        if focus {
            self.select(passenger);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::ItemKey;
    use crate::model::tile::{BuildingKind, Tile};
    use crate::testutil::{crewed_vehicle, officer_at, seeded_rng, surface, worker_at};

    #[test]
    fn set_crew_is_idempotent() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let (wagon, crew) = crewed_vehicle(&mut world, &mut rng, "wagon", surface(0, 0));
        let before = world.unit(wagon).unwrap().clone();
        world.drain_effects();

        world.set_crew(wagon, Some(crew));
        assert_eq!(world.unit(wagon).unwrap(), &before);
        assert!(world.drain_effects().is_empty());
    }

    #[test]
    fn crewing_flips_activity_and_capacity() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let (wagon, crew) = crewed_vehicle(&mut world, &mut rng, "wagon", surface(0, 0));
        let unit = world.unit(wagon).unwrap();
        assert!(unit.all_permissions(&[Permission::Active, Permission::ActiveVehicle]));
        assert!(!unit.get_permission(Permission::InactiveVehicle));
        assert_eq!(unit.inventory_capacity, 9.0);
        assert_eq!(
            world.unit(crew).unwrap().container,
            Some(Container::Crewing { vehicle: wagon })
        );

        world
            .unit_mut(wagon)
            .unwrap()
            .inventory
            .change(&ItemKey::Food, 3.0);
        world.set_permission(wagon, Permission::SentryMode, Some(true), false, true);
        assert_eq!(world.uncrew_vehicle(wagon, true), Ok(crew));
        let unit = world.unit(wagon).unwrap();
        assert!(!unit.any_permissions(&[Permission::Active, Permission::SentryMode]));
        assert!(unit.get_permission(Permission::InactiveVehicle));
        assert_eq!(unit.inventory_capacity, 0.0);
        assert!(unit.inventory.is_empty());
        assert_eq!(
            world.tile(surface(0, 0)).unwrap().get_inventory(&ItemKey::Food),
            3.0
        );
        assert!(world.unit(crew).unwrap().is_independent());
        assert_eq!(world.displayed, Some(crew));
    }

    #[test]
    fn crewing_is_validated_before_mutation() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let (wagon, _) = crewed_vehicle(&mut world, &mut rng, "wagon", surface(0, 0));
        let spare = worker_at(&mut world, &mut rng, surface(0, 0));
        let far = worker_at(&mut world, &mut rng, surface(5, 5));
        let officer = officer_at(&mut world, &mut rng, "explorer", surface(0, 0));

        assert_eq!(world.crew_vehicle(wagon, spare), Err(UnitError::AlreadyCrewed(wagon)));
        assert!(matches!(
            world.crew_vehicle(wagon, officer),
            Err(UnitError::WrongClass { .. })
        ));
        world.uncrew_vehicle(wagon, false).unwrap();
        assert_eq!(world.crew_vehicle(wagon, far), Err(UnitError::NotColocated(wagon, far)));
        assert!(world.unit(far).unwrap().is_independent());
    }

    #[test]
    fn uncrewed_vehicles_refuse_passengers() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let (wagon, _) = crewed_vehicle(&mut world, &mut rng, "wagon", surface(0, 0));
        world.uncrew_vehicle(wagon, false).unwrap();
        let officer = officer_at(&mut world, &mut rng, "explorer", surface(0, 0));
        assert_eq!(world.embark(wagon, officer), Err(UnitError::NoCrew(wagon)));
    }

    #[test]
    fn uncrew_refused_while_carrying_passengers() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let (wagon, _) = crewed_vehicle(&mut world, &mut rng, "wagon", surface(0, 0));
        let officer = officer_at(&mut world, &mut rng, "explorer", surface(0, 0));
        world.embark(wagon, officer).unwrap();
        assert_eq!(
            world.uncrew_vehicle(wagon, false),
            Err(UnitError::HasPassengers(wagon))
        );
    }

    #[test]
    fn disembark_without_port_disorganizes() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let (ship, _) = crewed_vehicle(&mut world, &mut rng, "steamship", surface(0, 0));
        let officer = officer_at(&mut world, &mut rng, "explorer", surface(0, 0));
        world.embark(ship, officer).unwrap();
        assert!(world.turn_queue().iter().all(|id| *id != officer));

        world.disembark(ship, officer, false).unwrap();
        assert!(world.unit(officer).unwrap().get_permission(Permission::Disorganized));

        world.add_tile(Tile::new(surface(0, 0)).with_building(BuildingKind::Port));
        let other = officer_at(&mut world, &mut rng, "explorer", surface(0, 0));
        world.embark(ship, other).unwrap();
        world.disembark(ship, other, false).unwrap();
        assert!(!world.unit(other).unwrap().get_permission(Permission::Disorganized));
    }

    #[test]
    fn eject_focuses_only_last_passenger() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let (wagon, _) = crewed_vehicle(&mut world, &mut rng, "wagon", surface(0, 0));
        let a = officer_at(&mut world, &mut rng, "explorer", surface(0, 0));
        let b = officer_at(&mut world, &mut rng, "explorer", surface(0, 0));
        world.embark(wagon, a).unwrap();
        world.embark(wagon, b).unwrap();
        world.drain_effects();

        assert_eq!(world.eject_passengers(wagon, true), vec![a, b]);
        let selections: Vec<_> = world
            .drain_effects()
            .into_iter()
            .filter(|e| matches!(e, Effect::Select { .. }))
            .collect();
        assert_eq!(selections, vec![Effect::Select { unit_id: b }]);
    }

    #[test]
    fn reembark_skips_the_dead() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let (wagon, crew) = crewed_vehicle(&mut world, &mut rng, "wagon", surface(0, 0));
        let a = officer_at(&mut world, &mut rng, "explorer", surface(0, 0));
        let b = officer_at(&mut world, &mut rng, "explorer", surface(0, 0));
        world.embark(wagon, a).unwrap();
        world.embark(wagon, b).unwrap();

        world.eject_passengers(wagon, false);
        world.eject_crew(wagon, false);
        world.die(a, crate::model::world::DeathCause::Killed);

        assert_eq!(world.reembark(wagon), vec![crew, b]);
        let data = world.unit(wagon).unwrap().kind.as_vehicle().unwrap();
        assert_eq!(data.crew, Some(crew));
        assert_eq!(data.passengers, vec![b]);
        assert!(data.ejected_passengers.is_empty());
    }

    #[test]
    fn vehicle_death_ejects_everyone() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let (wagon, crew) = crewed_vehicle(&mut world, &mut rng, "wagon", surface(0, 0));
        let a = officer_at(&mut world, &mut rng, "explorer", surface(0, 0));
        world.embark(wagon, a).unwrap();

        world.die(wagon, crate::model::world::DeathCause::Killed);
        assert!(!world.is_alive(wagon));
        assert!(world.unit(crew).unwrap().is_independent());
        assert!(world.unit(a).unwrap().is_independent());
    }

    #[test]
    fn firing_a_vehicle_fires_its_sub_mobs() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let (wagon, crew) = crewed_vehicle(&mut world, &mut rng, "wagon", surface(0, 0));
        let a = officer_at(&mut world, &mut rng, "explorer", surface(0, 0));
        world.embark(wagon, a).unwrap();
        let before = world.worker_types["european_workers"].number;

        world.fire(wagon);
        assert!(world.units.is_empty());
        assert_eq!(world.worker_types["european_workers"].number, before - 1);
        assert!(!world.is_alive(crew));
    }
}
