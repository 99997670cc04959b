use std::collections::BTreeSet;

use super::item::{Inventory, ItemKey};
use super::permission::{Permission, PermissionStore};
use super::tile::{Coordinates, Habitability};
use super::unit::{Movable, UnitKind};
use super::unit_type::UnitClass;
use super::world::World;
use crate::error::UnitError;
use crate::id::UnitId;
use crate::rules::Rules;
use crate::units::generate_group_movement_points;

/// Composition of a preview actor. Sub-mobs are owned copies.
#[derive(Debug, Clone, PartialEq)]
pub enum DummyKind {
    Worker,
    Officer,
    Group {
        worker: Box<Dummy>,
        officer: Box<Dummy>,
    },
    Vehicle {
        crew: Option<Box<Dummy>>,
        passengers: Vec<Dummy>,
    },
}

/// Inert stand-in for a unit, used to preview reorganizations. A dummy owns
/// all of its state; nothing done to it reaches the world.
#[derive(Debug, Clone, PartialEq)]
pub struct Dummy {
    /// Live unit this was copied from, if any.
    pub source: Option<UnitId>,
    pub name: String,
    pub unit_type: String,
    pub location: Coordinates,
    pub habitability: Habitability,
    pub movement_points: f64,
    pub max_movement_points: f64,
    pub permissions: PermissionStore,
    pub inventory: Inventory,
    pub inventory_capacity: f64,
    pub equipment: BTreeSet<ItemKey>,
    pub kind: DummyKind,
}

impl Movable for Dummy {
    fn movement_points(&self) -> f64 {
        self.movement_points
    }

    fn max_movement_points(&self) -> f64 {
        self.max_movement_points
    }

    fn has_permission(&self, key: Permission) -> bool {
        self.permissions.get_permission(key)
    }
}

impl Dummy {
    /// Deep copy of a live unit and everything it holds.
    pub fn from_unit(world: &World, id: UnitId) -> Result<Dummy, UnitError> {
        let unit = world.get(id)?;
        let kind = match &unit.kind {
            UnitKind::Worker(_) => DummyKind::Worker,
            UnitKind::Officer(_) => DummyKind::Officer,
            UnitKind::Group(g) => DummyKind::Group {
                worker: Box::new(Dummy::from_unit(world, g.worker)?),
                officer: Box::new(Dummy::from_unit(world, g.officer)?),
            },
            UnitKind::Vehicle(v) => DummyKind::Vehicle {
                crew: v
                    .crew
                    .map(|c| Dummy::from_unit(world, c).map(Box::new))
                    .transpose()?,
                passengers: v
                    .passengers
                    .iter()
                    .map(|p| Dummy::from_unit(world, *p))
                    .collect::<Result<_, _>>()?,
            },
        };
        Ok(Dummy {
            source: Some(id),
            name: unit.name.clone(),
            unit_type: unit.unit_type.clone(),
            location: unit.location,
            habitability: world.experienced_habitability(id),
            movement_points: unit.movement_points,
            max_movement_points: unit.max_movement_points,
            permissions: unit.permissions.clone(),
            inventory: unit.inventory.clone(),
            inventory_capacity: unit.inventory_capacity,
            equipment: unit.equipment.clone(),
            kind,
        })
    }

    pub fn class(&self) -> UnitClass {
        match self.kind {
            DummyKind::Worker => UnitClass::Worker,
            DummyKind::Officer => UnitClass::Officer,
            DummyKind::Group { .. } => UnitClass::Group,
            DummyKind::Vehicle { .. } => UnitClass::Vehicle,
        }
    }

    fn require_class(&self, expected: UnitClass) -> Result<(), UnitError> {
        if self.class() != expected {
            return Err(UnitError::TypeClassMismatch {
                key: self.unit_type.clone(),
                expected,
            });
        }
        Ok(())
    }

    /// What merging `worker` and `officer` would produce. Either member may
    /// be unpicked in the reorganization UI, which is refused here.
    ///
    /// The preview stands where the officer stands and experiences the
    /// officer's habitability.
    pub fn preview_group(
        rules: &Rules,
        worker: Option<&Dummy>,
        officer: Option<&Dummy>,
    ) -> Result<Dummy, UnitError> {
        let worker = worker.ok_or(UnitError::MissingMember("worker"))?;
        let officer = officer.ok_or(UnitError::MissingMember("officer"))?;
        worker.require_class(UnitClass::Worker)?;
        officer.require_class(UnitClass::Officer)?;
        let group_key = rules
            .unit_type(&officer.unit_type)
            .and_then(|t| t.group_type.clone())
            .ok_or_else(|| UnitError::NoGroupType(officer.unit_type.clone()))?;
        let group_type = rules
            .unit_type(&group_key)
            .ok_or_else(|| UnitError::UnknownUnitType(group_key.clone()))?;

        let (movement_points, max_movement_points) =
            generate_group_movement_points(worker, officer, rules.fixed_group_movement_points);
        let mut permissions = group_type.initial_permissions();
        let mut name = group_type.name.clone();
        if officer.has_permission(Permission::Veteran) {
            permissions.set_permission(Permission::Veteran, Some(true), false);
            name = format!("veteran {name}");
        }
        if worker.has_permission(Permission::Disorganized)
            || officer.has_permission(Permission::Disorganized)
        {
            permissions.set_permission(Permission::Disorganized, Some(true), false);
        }
        let mut inventory = worker.inventory.clone();
        inventory.absorb(officer.inventory.clone());

        Ok(Dummy {
            source: None,
            name,
            unit_type: group_key,
            location: officer.location,
            habitability: officer.habitability,
            movement_points,
            max_movement_points,
            permissions,
            inventory,
            inventory_capacity: group_type.inventory_capacity,
            equipment: worker.equipment.union(&officer.equipment).cloned().collect(),
            kind: DummyKind::Group {
                worker: Box::new(worker.clone()),
                officer: Box::new(officer.clone()),
            },
        })
    }

    /// What `vehicle` would look like with `crew` in its crew slot.
    pub fn preview_crewed(
        rules: &Rules,
        vehicle: &Dummy,
        crew: Option<&Dummy>,
    ) -> Result<Dummy, UnitError> {
        vehicle.require_class(UnitClass::Vehicle)?;
        if let Some(crew) = crew {
            crew.require_class(UnitClass::Worker)?;
        }
        let mut preview = vehicle.clone();
        preview.source = None;
        let crewed = crew.is_some();
        if let DummyKind::Vehicle { crew: slot, .. } = &mut preview.kind {
            *slot = crew.map(|c| Box::new(c.clone()));
        }
        preview.inventory_capacity = if crewed {
            rules
                .unit_type(&vehicle.unit_type)
                .map_or(0.0, |t| t.inventory_capacity)
        } else {
            0.0
        };
        let permissions = &mut preview.permissions;
        permissions.set_permission(Permission::Active, Some(crewed), false);
        permissions.set_permission(Permission::ActiveVehicle, Some(crewed), false);
        permissions.set_permission(Permission::InactiveVehicle, Some(!crewed), false);
        permissions.set_permission(Permission::SentryMode, None, false);
        Ok(preview)
    }

    /// The worker and officer a group preview would split into.
    pub fn preview_disband(&self) -> Result<(Dummy, Dummy), UnitError> {
        let DummyKind::Group { worker, officer } = &self.kind else {
            return Err(UnitError::TypeClassMismatch {
                key: self.unit_type.clone(),
                expected: UnitClass::Group,
            });
        };
        let ratio = self.movement_ratio();
        let disorganized = self.has_permission(Permission::Disorganized);
        let release = |member: &Dummy| {
            let mut member = member.clone();
            member.location = self.location;
            member.movement_points = (member.max_movement_points * ratio).floor();
            member.permissions.set_permission(
                Permission::Disorganized,
                disorganized.then_some(true),
                false,
            );
            member
        };
        Ok((release(worker), release(officer)))
    }

    /// Every dummy held inside this one, depth first.
    pub fn sub_dummies(&self) -> Vec<&Dummy> {
        let direct: Vec<&Dummy> = match &self.kind {
            DummyKind::Worker | DummyKind::Officer => Vec::new(),
            DummyKind::Group { worker, officer } => vec![worker.as_ref(), officer.as_ref()],
            DummyKind::Vehicle { crew, passengers } => {
                crew.as_deref().into_iter().chain(passengers.iter()).collect()
            }
        };
        direct
            .into_iter()
            .flat_map(|d| std::iter::once(d).chain(d.sub_dummies()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tile::{Grid, Tile};
    use crate::testutil::{crewed_vehicle, group_at, officer_at, seeded_rng, surface, worker_at};

    #[test]
    fn copy_is_independent_of_the_live_unit() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let (group, worker, _) = group_at(&mut world, &mut rng, "explorer", surface(0, 0));
        world
            .unit_mut(group)
            .unwrap()
            .inventory
            .change(&ItemKey::Food, 2.0);
        let before = world.unit(group).unwrap().clone();
        let worker_before = world.unit(worker).unwrap().clone();

        let mut dummy = Dummy::from_unit(&world, group).unwrap();
        let live = world.unit(group).unwrap();
        assert!(!std::ptr::eq(&dummy.permissions, &live.permissions));
        assert!(!std::ptr::eq(&dummy.inventory, &live.inventory));

        dummy
            .permissions
            .set_permission(Permission::Veteran, Some(true), false);
        dummy.inventory.change(&ItemKey::Food, -2.0);
        dummy.location = surface(9, 9);
        if let DummyKind::Group { worker, .. } = &mut dummy.kind {
            worker
                .permissions
                .set_permission(Permission::Disorganized, Some(true), false);
        }

        assert_eq!(world.unit(group).unwrap(), &before);
        assert_eq!(world.unit(worker).unwrap(), &worker_before);
    }

    #[test]
    fn group_preview_matches_real_merge() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let worker = worker_at(&mut world, &mut rng, surface(0, 0));
        let officer = officer_at(&mut world, &mut rng, "explorer", surface(0, 0));
        world.unit_mut(worker).unwrap().movement_points = 1.0;
        world.promote_officer(officer);

        let preview = Dummy::preview_group(
            &world.rules,
            Some(&Dummy::from_unit(&world, worker).unwrap()),
            Some(&Dummy::from_unit(&world, officer).unwrap()),
        )
        .unwrap();
        let group = world.merge_group(worker, officer, false).unwrap();
        let real = world.unit(group).unwrap();

        assert_eq!(preview.name, real.name);
        assert_eq!(preview.movement_points, real.movement_points);
        assert_eq!(preview.max_movement_points, real.max_movement_points);
        assert!(preview.has_permission(Permission::Veteran));
    }

    #[test]
    fn group_preview_without_officer_is_refused() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let worker = worker_at(&mut world, &mut rng, surface(0, 0));
        let dummy = Dummy::from_unit(&world, worker).unwrap();
        assert_eq!(
            Dummy::preview_group(&world.rules, Some(&dummy), None),
            Err(UnitError::MissingMember("officer"))
        );
        assert_eq!(
            Dummy::preview_group(&world.rules, None, Some(&dummy)),
            Err(UnitError::MissingMember("worker"))
        );
    }

    #[test]
    fn group_preview_uses_officer_habitability() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let at = surface(2, 2);
        world.add_tile(Tile::new(at).with_habitability(Habitability::Hostile));
        let worker = worker_at(&mut world, &mut rng, surface(0, 0));
        let officer = officer_at(&mut world, &mut rng, "explorer", at);
        let preview = Dummy::preview_group(
            &world.rules,
            Some(&Dummy::from_unit(&world, worker).unwrap()),
            Some(&Dummy::from_unit(&world, officer).unwrap()),
        )
        .unwrap();
        assert_eq!(preview.location, at);
        assert_eq!(preview.habitability, Habitability::Hostile);
    }

    #[test]
    fn crewed_preview_flips_activity() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let (wagon, _) = crewed_vehicle(&mut world, &mut rng, "wagon", surface(0, 0));
        let dummy = Dummy::from_unit(&world, wagon).unwrap();

        let uncrewed = Dummy::preview_crewed(&world.rules, &dummy, None).unwrap();
        assert!(uncrewed.has_permission(Permission::InactiveVehicle));
        assert_eq!(uncrewed.inventory_capacity, 0.0);
        assert!(uncrewed.sub_dummies().is_empty());

        let spare = worker_at(&mut world, &mut rng, surface(0, 0));
        let recrewed = Dummy::preview_crewed(
            &world.rules,
            &uncrewed,
            Some(&Dummy::from_unit(&world, spare).unwrap()),
        )
        .unwrap();
        assert!(recrewed.has_permission(Permission::ActiveVehicle));
        assert_eq!(recrewed.inventory_capacity, 9.0);
        assert!(world.unit(wagon).unwrap().get_permission(Permission::Active));
    }

    #[test]
    fn disband_preview_keeps_ratio() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let (group, _, _) = group_at(&mut world, &mut rng, "explorer", surface(0, 0));
        let mut dummy = Dummy::from_unit(&world, group).unwrap();
        dummy.movement_points = dummy.max_movement_points / 2.0;
        let (worker, officer) = dummy.preview_disband().unwrap();
        assert_eq!(worker.movement_points, (worker.max_movement_points / 2.0).floor());
        assert_eq!(officer.movement_points, (officer.max_movement_points / 2.0).floor());

        assert!(worker.preview_disband().is_err());
    }

    #[test]
    fn sub_dummies_walk_nested_units() {
        let mut world = World::default();
        let mut rng = seeded_rng();
        let at = Coordinates::new(Grid::Surface, 0, 0);
        let (ship, _) = crewed_vehicle(&mut world, &mut rng, "steamship", at);
        let (group, _, _) = group_at(&mut world, &mut rng, "explorer", at);
        world.embark(ship, group).unwrap();
        let dummy = Dummy::from_unit(&world, ship).unwrap();
        assert_eq!(dummy.sub_dummies().len(), 4);
    }
}
