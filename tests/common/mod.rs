#![allow(dead_code)]

use colony_units::UnitId;
use colony_units::model::*;
use rand::SeedableRng;
use rand::rngs::SmallRng;

pub fn surface(x: i32, y: i32) -> Coordinates {
    Coordinates::new(Grid::Surface, x, y)
}

/// A world plus the RNG used to populate it.
pub struct Outpost {
    pub world: World,
    pub rng: SmallRng,
}

impl Outpost {
    pub fn new() -> Self {
        Self {
            world: World::default(),
            rng: SmallRng::seed_from_u64(7),
        }
    }

    pub fn stock(&mut self, at: Coordinates, items: &[(ItemKey, f64)]) -> &mut Self {
        for (key, amount) in items {
            self.world.tile_mut(at).change_inventory(key, *amount);
        }
        self
    }

    pub fn worker(&mut self, at: Coordinates) -> UnitId {
        self.world
            .create_unit(
                UnitInit::Worker {
                    worker_type: "european_workers".to_string(),
                    location: at,
                },
                &mut self.rng,
            )
            .unwrap()
    }

    pub fn officer(&mut self, unit_type: &str, at: Coordinates) -> UnitId {
        self.world
            .create_unit(
                UnitInit::Officer {
                    unit_type: unit_type.to_string(),
                    location: at,
                },
                &mut self.rng,
            )
            .unwrap()
    }

    /// Returns `(group, worker, officer)`.
    pub fn group(&mut self, officer_type: &str, at: Coordinates) -> (UnitId, UnitId, UnitId) {
        let worker = self.worker(at);
        let officer = self.officer(officer_type, at);
        let group = self
            .world
            .create_unit(UnitInit::Group { worker, officer }, &mut self.rng)
            .unwrap();
        (group, worker, officer)
    }

    /// Returns `(vehicle, crew)`.
    pub fn vehicle(&mut self, unit_type: &str, at: Coordinates) -> (UnitId, UnitId) {
        let crew = self.worker(at);
        let vehicle = self
            .world
            .create_unit(
                UnitInit::Vehicle {
                    unit_type: unit_type.to_string(),
                    location: at,
                    crew: Some(crew),
                },
                &mut self.rng,
            )
            .unwrap();
        (vehicle, crew)
    }
}

pub fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}
