use crate::error::UnitError;
use crate::id::UnitId;
use crate::model::permission::Permission;
use crate::model::tile::Coordinates;
use crate::model::unit::{UnitKind, WorkerData};
use crate::model::unit_type::{ReplacementSource, UnitClass};
use crate::model::world::World;

use super::pmob::new_pmob;

impl World {
    /// Recruit a worker from its labor pool.
    pub(crate) fn spawn_worker(
        &mut self,
        worker_type: &str,
        location: Coordinates,
    ) -> Result<UnitId, UnitError> {
        let pool = self
            .worker_types
            .get(worker_type)
            .cloned()
            .ok_or_else(|| UnitError::UnknownWorkerType(worker_type.to_string()))?;
        let unit_type = self.unit_type(&pool.unit_type)?.clone();
        if unit_type.class != UnitClass::Worker {
            return Err(UnitError::TypeClassMismatch {
                key: unit_type.key,
                expected: UnitClass::Worker,
            });
        }

        let id = self.id_gen.next_id();
        let mut unit = new_pmob(
            id,
            &unit_type,
            location,
            UnitKind::Worker(WorkerData {
                worker_type: worker_type.to_string(),
            }),
        );
        unit.name = pool.name.clone();
        unit.default_name = pool.name;
        for permission in pool.permissions {
            unit.permissions
                .set_permission(permission, Some(true), false);
        }
        self.insert_unit(unit);
        self.join_pool(worker_type);
        tracing::debug!(worker = %id, worker_type = %worker_type, "worker created");
        Ok(id)
    }

    pub(crate) fn join_pool(&mut self, worker_type: &str) {
        if let Some(pool) = self.worker_types.get_mut(worker_type) {
            pool.number += 1;
        }
    }

    /// Fresh workers replace a worn-out crew or group worker in place.
    /// Supply statuses go with the old workers.
    pub fn replace_worker(&mut self, worker: UnitId, announce: bool) {
        let unit = self.expect_unit(worker, "replace_worker");
        let Some(data) = unit.kind.as_worker() else {
            panic!("replace_worker: unit {worker} is not a worker");
        };
        let worker_type = data.worker_type.clone();
        for status in [Permission::Starvation, Permission::Dehydration] {
            self.set_permission(worker, status, None, false, true);
        }
        let Some(pool) = self.worker_types.get_mut(&worker_type) else {
            return;
        };
        pool.recruited += 1;
        let message = match pool.replacement_source {
            ReplacementSource::Hired => format!("Replacement {} have been hired.", pool.name),
            ReplacementSource::Volunteers => {
                format!("Replacement {} were found among the colonists.", pool.name)
            }
        };
        tracing::info!(worker = %worker, worker_type = %worker_type, "worker replaced");
        if announce {
            self.notify(message);
        }
    }
}
