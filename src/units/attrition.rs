//! Health attrition: units worn down by their surroundings are replaced or lost.

use rand::{Rng, RngCore};

use crate::id::UnitId;
use crate::model::effect::IncidentKind;
use crate::model::permission::Permission;
use crate::model::tile::{Grid, Habitability};
use crate::model::unit::UnitKind;
use crate::model::world::{DeathCause, World};

/// Per-turn attrition chance for a unit experiencing `habitability`.
pub fn attrition_chance(habitability: Habitability) -> f64 {
    match habitability {
        Habitability::Perfect => 0.0,
        Habitability::Mediocre => 0.01,
        Habitability::Unpleasant => 0.02,
        Habitability::Hostile => 0.05,
        Habitability::Deadly => 0.5,
    }
}

/// What an attrition roll did to a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttritionOutcome {
    WorkerReplaced { worker: UnitId },
    OfficerReplaced { officer: UnitId },
    CrewReplaced { vehicle: UnitId, crew: UnitId },
    Died,
}

impl World {
    /// Roll attrition for one independent unit. Units on the home grid and
    /// uncrewed vehicles are never affected.
    ///
    /// # Panics
    /// Panics if `id` is not in the registry.
    pub fn roll_health_attrition(
        &mut self,
        id: UnitId,
        rng: &mut dyn RngCore,
    ) -> Option<AttritionOutcome> {
        let unit = self.expect_unit(id, "roll_health_attrition");
        if unit.location.grid == Grid::Earth {
            return None;
        }
        let kind = unit.kind.clone();
        let chance = attrition_chance(self.experienced_habitability(id));
        if chance <= 0.0 || !rng.random_bool(chance) {
            return None;
        }

        let outcome = match kind {
            UnitKind::Group(group) => {
                if rng.random_bool(0.5) {
                    self.replace_worker(group.worker, true);
                    AttritionOutcome::WorkerReplaced {
                        worker: group.worker,
                    }
                } else {
                    self.replace_officer(group.officer);
                    self.set_permission(id, Permission::Veteran, None, false, true);
                    let unit = self.expect_unit_mut(id, "roll_health_attrition");
                    unit.name = unit.default_name.clone();
                    AttritionOutcome::OfficerReplaced {
                        officer: group.officer,
                    }
                }
            }
            UnitKind::Vehicle(vehicle) => {
                let crew = vehicle.crew?;
                self.replace_worker(crew, true);
                if let Some(data) = self
                    .expect_unit_mut(id, "roll_health_attrition")
                    .kind
                    .as_vehicle_mut()
                {
                    data.crew_replacing = true;
                }
                AttritionOutcome::CrewReplaced { vehicle: id, crew }
            }
            UnitKind::Worker(_) | UnitKind::Officer(_) => {
                let habitability = self.experienced_habitability(id);
                self.record_logistics_incident(
                    id,
                    IncidentKind::Attrition,
                    &format!("{habitability:?} conditions").to_lowercase(),
                );
                self.die(id, DeathCause::Attrition);
                AttritionOutcome::Died
            }
        };
        tracing::info!(unit = %id, ?outcome, "health attrition");
        Some(outcome)
    }
}
