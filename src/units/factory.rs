//! Unit construction from fresh parameters or save records, and the reverse.

use std::collections::BTreeSet;

use rand::RngCore;

use crate::error::UnitError;
use crate::id::UnitId;
use crate::model::permission::Permission;
use crate::model::save::{KindSave, UnitInit, UnitSave};
use crate::model::tile::Coordinates;
use crate::model::unit::{
    Container, GroupData, OfficerData, Pmob, UnitKind, UpkeepRecord, VehicleData, WorkerData,
};
use crate::model::unit_type::UnitClass;
use crate::model::world::World;

use super::officer::generate_character;
use super::pmob::new_pmob;

/// A sub-mob record must be of the class its slot holds.
fn require_slot(save: &UnitSave, expected: UnitClass) -> Result<(), UnitError> {
    if save.kind.class() == expected {
        Ok(())
    } else {
        Err(UnitError::TypeClassMismatch {
            key: save.unit_type.clone(),
            expected,
        })
    }
}

impl World {
    /// Create a unit that has never existed before.
    pub fn create_unit(
        &mut self,
        init: UnitInit,
        rng: &mut dyn RngCore,
    ) -> Result<UnitId, UnitError> {
        match init {
            UnitInit::Worker {
                worker_type,
                location,
            } => self.spawn_worker(&worker_type, location),
            UnitInit::Officer {
                unit_type,
                location,
            } => {
                let unit_type = self.unit_type(&unit_type)?.clone();
                if unit_type.class != UnitClass::Officer {
                    return Err(UnitError::TypeClassMismatch {
                        key: unit_type.key,
                        expected: UnitClass::Officer,
                    });
                }
                let character = generate_character(&self.rules, rng, &unit_type.name);
                let id = self.id_gen.next_id();
                self.insert_unit(new_pmob(
                    id,
                    &unit_type,
                    location,
                    UnitKind::Officer(OfficerData { character }),
                ));
                tracing::debug!(officer = %id, unit_type = %unit_type.key, "officer created");
                Ok(id)
            }
            UnitInit::Group { worker, officer } => self.merge_group(worker, officer, false),
            UnitInit::Vehicle {
                unit_type,
                location,
                crew,
            } => {
                let unit_type = self.unit_type(&unit_type)?.clone();
                if unit_type.class != UnitClass::Vehicle {
                    return Err(UnitError::TypeClassMismatch {
                        key: unit_type.key,
                        expected: UnitClass::Vehicle,
                    });
                }
                if let Some(crew) = crew {
                    self.require_class(crew, UnitClass::Worker)?;
                    self.require_independent(crew)?;
                }

                let id = self.id_gen.next_id();
                let mut vehicle = new_pmob(
                    id,
                    &unit_type,
                    location,
                    UnitKind::Vehicle(VehicleData {
                        vehicle_kind: unit_type.vehicle_kind,
                        ..VehicleData::default()
                    }),
                );
                vehicle.inventory_capacity = 0.0;
                vehicle
                    .permissions
                    .set_permission(Permission::InactiveVehicle, Some(true), false);
                self.insert_unit(vehicle);
                if let Some(crew) = crew {
                    self.set_location_recursive(crew, location);
                    self.attach_crew(id, crew);
                }
                tracing::debug!(vehicle = %id, unit_type = %unit_type.key, "vehicle created");
                Ok(id)
            }
        }
    }

    /// Rebuild a unit and all its sub-mobs from a save record. The whole
    /// record is checked before anything is inserted.
    pub fn restore_unit(&mut self, save: &UnitSave) -> Result<UnitId, UnitError> {
        self.validate_save(save, &mut BTreeSet::new())?;
        Ok(self.restore_tree(save, None, save.location))
    }

    fn validate_save(&self, save: &UnitSave, seen: &mut BTreeSet<UnitId>) -> Result<(), UnitError> {
        if self.is_alive(save.id) || !seen.insert(save.id) {
            return Err(UnitError::DuplicateId(save.id));
        }
        let unit_type = self.unit_type(&save.unit_type)?;
        let class = save.kind.class();
        match &save.kind {
            KindSave::Worker { worker_type } => {
                if !self.worker_types.contains_key(worker_type) {
                    return Err(UnitError::UnknownWorkerType(worker_type.clone()));
                }
            }
            KindSave::Officer { .. } => {}
            KindSave::Group { worker, officer } => {
                require_slot(worker, UnitClass::Worker)?;
                require_slot(officer, UnitClass::Officer)?;
                self.validate_save(worker, seen)?;
                self.validate_save(officer, seen)?;
            }
            KindSave::Vehicle {
                crew, passengers, ..
            } => {
                if let Some(crew) = crew {
                    require_slot(crew, UnitClass::Worker)?;
                    self.validate_save(crew, seen)?;
                }
                for passenger in passengers {
                    if passenger.kind.class() == UnitClass::Vehicle {
                        return Err(UnitError::CannotBoard(passenger.id));
                    }
                    self.validate_save(passenger, seen)?;
                }
            }
        }
        if unit_type.class != class {
            return Err(UnitError::TypeClassMismatch {
                key: save.unit_type.clone(),
                expected: class,
            });
        }
        Ok(())
    }

    /// Attached units take their container's location.
    fn restore_tree(
        &mut self,
        save: &UnitSave,
        container: Option<Container>,
        location: Coordinates,
    ) -> UnitId {
        let rated_capacity = self
            .rules
            .unit_type(&save.unit_type)
            .map_or(0.0, |t| t.inventory_capacity);
        let mut inventory_capacity = rated_capacity;
        let kind = match &save.kind {
            KindSave::Worker { worker_type } => {
                self.join_pool(worker_type);
                UnitKind::Worker(WorkerData {
                    worker_type: worker_type.clone(),
                })
            }
            KindSave::Officer { character } => UnitKind::Officer(OfficerData {
                character: character.clone(),
            }),
            KindSave::Group { worker, officer } => {
                let held = Some(Container::InGroup { group: save.id });
                UnitKind::Group(GroupData {
                    worker: self.restore_tree(worker, held, location),
                    officer: self.restore_tree(officer, held, location),
                })
            }
            KindSave::Vehicle {
                vehicle_kind,
                crew,
                passengers,
                crew_replacing,
            } => {
                let crew = crew.as_ref().map(|c| {
                    self.restore_tree(c, Some(Container::Crewing { vehicle: save.id }), location)
                });
                let passengers = passengers
                    .iter()
                    .map(|p| {
                        self.restore_tree(
                            p,
                            Some(Container::Passenger { vehicle: save.id }),
                            location,
                        )
                    })
                    .collect();
                if crew.is_none() {
                    inventory_capacity = 0.0;
                }
                UnitKind::Vehicle(VehicleData {
                    vehicle_kind: *vehicle_kind,
                    crew,
                    passengers,
                    ejected_crew: None,
                    ejected_passengers: Vec::new(),
                    crew_replacing: *crew_replacing,
                })
            }
        };

        self.insert_unit(Pmob {
            id: save.id,
            name: save.name.clone(),
            default_name: save.default_name.clone(),
            unit_type: save.unit_type.clone(),
            location,
            movement_points: save.movement_points,
            max_movement_points: save.max_movement_points,
            permissions: save.permissions.clone(),
            inventory: save.inventory.clone(),
            inventory_capacity,
            equipment: save.equipment.clone(),
            automatic_route: save.automatic_route.clone(),
            wait_until_full: save.wait_until_full,
            upkeep: UpkeepRecord::default(),
            container,
            kind,
        });
        save.id
    }

    /// Save record for a unit and, recursively, everything it holds.
    pub fn to_save(&self, id: UnitId) -> Result<UnitSave, UnitError> {
        self.get(id)?;
        Ok(self.save_tree(id))
    }

    /// Records for every independent unit; attached units are nested inside.
    pub fn save_all(&self) -> Vec<UnitSave> {
        self.independent_units()
            .into_iter()
            .map(|id| self.save_tree(id))
            .collect()
    }

    fn save_tree(&self, id: UnitId) -> UnitSave {
        let unit = self.expect_unit(id, "to_save");
        let kind = match &unit.kind {
            UnitKind::Worker(w) => KindSave::Worker {
                worker_type: w.worker_type.clone(),
            },
            UnitKind::Officer(o) => KindSave::Officer {
                character: o.character.clone(),
            },
            UnitKind::Group(g) => KindSave::Group {
                worker: Box::new(self.save_tree(g.worker)),
                officer: Box::new(self.save_tree(g.officer)),
            },
            UnitKind::Vehicle(v) => KindSave::Vehicle {
                vehicle_kind: v.vehicle_kind,
                crew: v.crew.map(|c| Box::new(self.save_tree(c))),
                passengers: v.passengers.iter().map(|p| self.save_tree(*p)).collect(),
                crew_replacing: v.crew_replacing,
            },
        };
        UnitSave {
            id,
            unit_type: unit.unit_type.clone(),
            name: unit.name.clone(),
            default_name: unit.default_name.clone(),
            location: unit.location,
            movement_points: unit.movement_points,
            max_movement_points: unit.max_movement_points,
            permissions: unit.permissions.clone(),
            inventory: unit.inventory.clone(),
            equipment: unit.equipment.clone(),
            automatic_route: unit.automatic_route.clone(),
            wait_until_full: unit.wait_until_full,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::ItemKey;
    use crate::testutil::{crewed_vehicle, group_at, officer_at, seeded_rng, surface};

    #[test]
    fn vehicle_crewed_on_creation() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let (wagon, crew) = crewed_vehicle(&mut world, &mut rng, "wagon", surface(3, 3));
        let data = world.unit(wagon).unwrap().kind.as_vehicle().unwrap();
        assert_eq!(data.crew, Some(crew));
        assert_eq!(world.unit(crew).unwrap().location, surface(3, 3));
    }

    #[test]
    fn uncrewed_vehicle_starts_inactive() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let ship = world
            .create_unit(
                UnitInit::Vehicle {
                    unit_type: "steamship".to_string(),
                    location: surface(0, 0),
                    crew: None,
                },
                &mut rng,
            )
            .unwrap();
        let unit = world.unit(ship).unwrap();
        assert!(unit.get_permission(Permission::InactiveVehicle));
        assert!(unit.get_permission(Permission::Ship));
        assert_eq!(unit.inventory_capacity, 0.0);
    }

    #[test]
    fn class_mismatch_is_refused() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let err = world
            .create_unit(
                UnitInit::Officer {
                    unit_type: "wagon".to_string(),
                    location: surface(0, 0),
                },
                &mut rng,
            )
            .unwrap_err();
        assert_eq!(
            err,
            UnitError::TypeClassMismatch {
                key: "wagon".to_string(),
                expected: UnitClass::Officer,
            }
        );
    }

    #[test]
    fn save_restore_rebuilds_nested_graph() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let (ship, crew) = crewed_vehicle(&mut world, &mut rng, "steamship", surface(0, 0));
        let (group, worker, officer) = group_at(&mut world, &mut rng, "explorer", surface(0, 0));
        let lone = officer_at(&mut world, &mut rng, "explorer", surface(0, 0));
        world.embark(ship, group).unwrap();
        world.embark(ship, lone).unwrap();
        world
            .unit_mut(ship)
            .unwrap()
            .inventory
            .change(&ItemKey::Fuel, 5.0);

        let save = world.to_save(ship).unwrap();
        assert_eq!(save.count_units(), 6);
        let json = serde_json::to_string(&save).unwrap();
        let back: UnitSave = serde_json::from_str(&json).unwrap();

        let mut restored = World::default();
        assert_eq!(restored.restore_unit(&back), Ok(ship));
        assert_eq!(restored.units.len(), 6);
        assert_eq!(restored.unit(ship), world.unit(ship));
        for id in [crew, group, worker, officer, lone] {
            assert_eq!(restored.unit(id), world.unit(id), "unit {id} differs");
        }
        assert_eq!(restored.worker_types["european_workers"].number, 2);
        assert!(restored.id_gen.next_id() > lone);
    }

    #[test]
    fn restore_rejects_live_ids_without_inserting() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let (group, _, _) = group_at(&mut world, &mut rng, "explorer", surface(0, 0));
        let save = world.to_save(group).unwrap();
        let before = world.units.len();
        assert_eq!(world.restore_unit(&save), Err(UnitError::DuplicateId(group)));
        assert_eq!(world.units.len(), before);
    }

    #[test]
    fn restore_rejects_swapped_group_members() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let (group, _, _) = group_at(&mut world, &mut rng, "explorer", surface(0, 0));
        let mut save = world.to_save(group).unwrap();
        world.fire(group);
        if let KindSave::Group { worker, officer } = &mut save.kind {
            std::mem::swap(worker, officer);
        }
        let officer_type = match &save.kind {
            KindSave::Group { worker, .. } => worker.unit_type.clone(),
            _ => unreachable!(),
        };

        assert_eq!(
            world.restore_unit(&save),
            Err(UnitError::TypeClassMismatch {
                key: officer_type,
                expected: UnitClass::Worker,
            })
        );
        assert!(world.units.is_empty());
    }

    #[test]
    fn restore_rejects_officer_as_crew() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let (wagon, crew) = crewed_vehicle(&mut world, &mut rng, "wagon", surface(0, 0));
        let officer = officer_at(&mut world, &mut rng, "explorer", surface(0, 0));
        let mut save = world.to_save(wagon).unwrap();
        let officer_save = world.to_save(officer).unwrap();
        world.fire(wagon);
        world.fire(officer);
        assert!(!world.is_alive(crew));
        if let KindSave::Vehicle { crew, .. } = &mut save.kind {
            *crew = Some(Box::new(officer_save));
        }

        assert!(matches!(
            world.restore_unit(&save),
            Err(UnitError::TypeClassMismatch {
                expected: UnitClass::Worker,
                ..
            })
        ));
        assert!(world.units.is_empty());
    }

    #[test]
    fn save_all_nests_attached_units() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        group_at(&mut world, &mut rng, "explorer", surface(0, 0));
        officer_at(&mut world, &mut rng, "explorer", surface(1, 0));
        let saves = world.save_all();
        assert_eq!(saves.len(), 2);
        assert_eq!(saves.iter().map(UnitSave::count_units).sum::<usize>(), 4);
    }
}
