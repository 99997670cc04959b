use std::collections::BTreeSet;

use crate::error::UnitError;
use crate::id::UnitId;
use crate::model::effect::{Effect, SoundCue};
use crate::model::item::ItemKey;
use crate::model::permission::Permission;
use crate::model::unit::{Container, GroupData, Movable, UnitKind};
use crate::model::unit_type::UnitClass;
use crate::model::world::World;

use super::pmob::new_pmob;

/// `(movement_points, max_movement_points)` for a group formed from
/// `worker` and `officer`.
///
/// Max is the officer's, or `fixed_max` for a veteran driver. Current is the
/// max scaled by the more tired member's ratio, rounded down.
pub fn generate_group_movement_points(
    worker: &impl Movable,
    officer: &impl Movable,
    fixed_max: f64,
) -> (f64, f64) {
    let max = if officer.has_permission(Permission::Driver)
        && officer.has_permission(Permission::Veteran)
    {
        fixed_max
    } else {
        officer.max_movement_points()
    };
    let ratio = worker.movement_ratio().min(officer.movement_ratio());
    ((max * ratio).floor(), max)
}

impl World {
    /// Merge an independent worker and officer on the same tile into a new
    /// group. The officer's type names the group type.
    pub fn merge_group(
        &mut self,
        worker: UnitId,
        officer: UnitId,
        focus: bool,
    ) -> Result<UnitId, UnitError> {
        self.require_class(worker, UnitClass::Worker)?;
        let officer_type = self
            .require_class(officer, UnitClass::Officer)?
            .unit_type
            .clone();
        self.require_independent(worker)?;
        self.require_independent(officer)?;
        self.require_colocated(worker, officer)?;
        let group_key = self
            .unit_type(&officer_type)?
            .group_type
            .clone()
            .ok_or(UnitError::NoGroupType(officer_type))?;
        let group_type = self.unit_type(&group_key)?.clone();
        if group_type.class != UnitClass::Group {
            return Err(UnitError::TypeClassMismatch {
                key: group_key,
                expected: UnitClass::Group,
            });
        }

        let w = self.expect_unit(worker, "merge_group").clone();
        let o = self.expect_unit(officer, "merge_group").clone();
        let location = o.location;
        let (movement_points, max_movement_points) =
            generate_group_movement_points(&w, &o, self.rules.fixed_group_movement_points);

        let id = self.id_gen.next_id();
        let mut group = new_pmob(
            id,
            &group_type,
            location,
            UnitKind::Group(GroupData { worker, officer }),
        );
        group.movement_points = movement_points;
        group.max_movement_points = max_movement_points;
        if o.get_permission(Permission::Veteran) {
            group
                .permissions
                .set_permission(Permission::Veteran, Some(true), false);
            group.name = format!("veteran {}", group.name);
        }
        if w.get_permission(Permission::Disorganized) || o.get_permission(Permission::Disorganized)
        {
            group
                .permissions
                .set_permission(Permission::Disorganized, Some(true), false);
        }
        for member in [worker, officer] {
            let unit = self.expect_unit_mut(member, "merge_group");
            let carried = unit.inventory.drain();
            group.inventory.absorb(carried);
        }
        self.insert_unit(group);

        for member in [worker, officer] {
            let unit = self.expect_unit_mut(member, "merge_group");
            unit.container = Some(Container::InGroup { group: id });
            unit.automatic_route.clear();
            self.set_permission(member, Permission::InGroup, Some(true), false, false);
            self.set_permission(member, Permission::SentryMode, None, false, false);
        }
        self.reconcile_group_equipment(id, &w.equipment, &o.equipment);

        if focus || self.displayed == Some(worker) || self.displayed == Some(officer) {
            self.select(id);
        }
        tracing::info!(group = %id, worker = %worker, officer = %officer, "group formed");
        Ok(id)
    }

    /// Duplicates between members go to the tile; the group keeps what it can
    /// carry and drops the rest.
    fn reconcile_group_equipment(
        &mut self,
        group: UnitId,
        worker_equipment: &BTreeSet<ItemKey>,
        officer_equipment: &BTreeSet<ItemKey>,
    ) {
        let location = self.expect_unit(group, "reconcile_group_equipment").location;
        let [worker, officer] = self.group_members(group);
        for (member, items) in [(worker, worker_equipment), (officer, officer_equipment)] {
            self.expect_unit_mut(member, "reconcile_group_equipment")
                .equipment
                .clear();
            for item in items {
                self.set_equipment_grants(member, item, false);
            }
        }
        for item in worker_equipment.intersection(officer_equipment) {
            self.tile_mut(location).change_inventory(item, 1.0);
        }

        let pooled: BTreeSet<ItemKey> = worker_equipment.union(officer_equipment).cloned().collect();
        for item in pooled {
            let supported = {
                let unit = self.expect_unit(group, "reconcile_group_equipment");
                self.rules
                    .equipment_type(&item)
                    .is_some_and(|eq| eq.can_equip(&unit.permissions))
            };
            if supported {
                self.expect_unit_mut(group, "reconcile_group_equipment")
                    .equipment
                    .insert(item.clone());
                self.set_equipment_grants(group, &item, true);
            } else {
                self.tile_mut(location).change_inventory(&item, 1.0);
            }
        }
    }

    /// # Panics
    /// Panics if `group` is not a live group.
    pub(crate) fn group_members(&self, group: UnitId) -> [UnitId; 2] {
        let data = self
            .expect_unit(group, "group_members")
            .kind
            .as_group()
            .unwrap_or_else(|| panic!("group_members: unit {group} is not a group"));
        [data.worker, data.officer]
    }

    /// Promote a group: porters get fixed max movement, the officer becomes a
    /// veteran, and the group is renamed once. Returns false if the group was
    /// already veteran.
    pub fn promote_group(&mut self, group: UnitId) -> Result<bool, UnitError> {
        let unit = self.require_class(group, UnitClass::Group)?;
        let porters = unit.get_permission(Permission::Porters);
        let veteran = unit.get_permission(Permission::Veteran);
        let [_, officer] = self.group_members(group);

        if porters {
            let fixed = self.rules.fixed_group_movement_points;
            self.expect_unit_mut(group, "promote_group").max_movement_points = fixed;
        }
        self.promote_officer(officer);
        if veteran {
            return Ok(false);
        }
        self.set_permission(group, Permission::Veteran, Some(true), false, true);
        let unit = self.expect_unit_mut(group, "promote_group");
        unit.name = format!("veteran {}", unit.name);
        self.emit(Effect::Sound {
            cue: SoundCue::Promotion,
        });
        tracing::info!(group = %group, "group promoted");
        Ok(true)
    }

    /// Split an independent group back into its worker and officer.
    pub fn disband_group(
        &mut self,
        group: UnitId,
        focus: bool,
    ) -> Result<(UnitId, UnitId), UnitError> {
        self.require_class(group, UnitClass::Group)?;
        self.require_independent(group)?;
        Ok(self.disband_members(group, focus))
    }

    /// Release both members at the group's tile, each keeping the group's
    /// movement ratio against its own max. A group riding as a passenger is
    /// taken off the vehicle first.
    ///
    /// # Panics
    /// Panics if `group` is not a live group.
    pub(crate) fn disband_members(&mut self, group: UnitId, focus: bool) -> (UnitId, UnitId) {
        let [worker, officer] = self.group_members(group);
        if let Some(Container::Passenger { vehicle }) =
            self.expect_unit(group, "disband_members").container
        {
            self.detach_passenger(vehicle, group, false, false);
        }
        let snapshot = self.expect_unit(group, "disband_members").clone();
        let location = snapshot.location;

        for item in &snapshot.equipment {
            self.set_equipment_grants(group, item, false);
            let taker = [officer, worker].into_iter().find(|m| {
                let unit = self.expect_unit(*m, "disband_members");
                !unit.equipment.contains(item)
                    && self
                        .rules
                        .equipment_type(item)
                        .is_some_and(|eq| eq.can_equip(&unit.permissions))
            });
            match taker {
                Some(member) => {
                    self.expect_unit_mut(member, "disband_members")
                        .equipment
                        .insert(item.clone());
                    self.set_equipment_grants(member, item, true);
                }
                None => self.tile_mut(location).change_inventory(item, 1.0),
            }
        }
        self.tile_mut(location)
            .inventory
            .absorb(snapshot.inventory.clone());

        let ratio = snapshot.movement_ratio();
        let disorganized = snapshot.get_permission(Permission::Disorganized);
        for member in [worker, officer] {
            let unit = self.expect_unit_mut(member, "disband_members");
            unit.container = None;
            unit.location = location;
            unit.movement_points = (unit.max_movement_points * ratio).floor();
            self.set_permission(member, Permission::InGroup, None, false, false);
            let inherited = if disorganized { Some(true) } else { None };
            self.set_permission(member, Permission::Disorganized, inherited, false, true);
        }

        let was_displayed = self.displayed == Some(group);
        self.remove_unit(group);
        if focus || was_displayed {
            self.select(officer);
        }
        tracing::info!(group = %group, worker = %worker, officer = %officer, "group disbanded");
        (worker, officer)
    }
}
