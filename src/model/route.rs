use serde::{Deserialize, Serialize};

use super::tile::Coordinates;

/// One stop in the cyclic route schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteStep {
    /// Pickup at the first waypoint.
    Start,
    /// Dropoff at the last waypoint.
    End,
    Waypoint { coordinates: Coordinates },
}

/// A player-configured pickup/dropoff schedule.
///
/// `in_progress` is derived from `base` and is rebuilt whole on every change
/// to `base`; advancing only rotates it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Coordinates>", into = "Vec<Coordinates>")]
pub struct AutomaticRoute {
    base: Vec<Coordinates>,
    in_progress: Vec<RouteStep>,
}

impl From<Vec<Coordinates>> for AutomaticRoute {
    fn from(base: Vec<Coordinates>) -> Self {
        AutomaticRoute::new(base)
    }
}

impl From<AutomaticRoute> for Vec<Coordinates> {
    fn from(route: AutomaticRoute) -> Self {
        route.base
    }
}

impl AutomaticRoute {
    pub fn new(base: Vec<Coordinates>) -> Self {
        let mut route = Self {
            base,
            in_progress: Vec::new(),
        };
        route.recompute();
        route
    }

    pub fn base(&self) -> &[Coordinates] {
        &self.base
    }

    pub fn in_progress(&self) -> &[RouteStep] {
        &self.in_progress
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    pub fn pickup(&self) -> Option<Coordinates> {
        self.base.first().copied()
    }

    pub fn dropoff(&self) -> Option<Coordinates> {
        self.base.last().copied()
    }

    pub fn push_waypoint(&mut self, coordinates: Coordinates) {
        self.base.push(coordinates);
        self.recompute();
    }

    pub fn clear(&mut self) {
        self.base.clear();
        self.in_progress.clear();
    }

    /// `[Start, wp2..wpN, End, wpN-1..wp1]`.
    pub fn recompute(&mut self) {
        self.in_progress.clear();
        if self.base.is_empty() {
            return;
        }
        self.in_progress.push(RouteStep::Start);
        self.in_progress.extend(
            self.base[1..]
                .iter()
                .map(|c| RouteStep::Waypoint { coordinates: *c }),
        );
        self.in_progress.push(RouteStep::End);
        self.in_progress.extend(
            self.base[..self.base.len() - 1]
                .iter()
                .rev()
                .map(|c| RouteStep::Waypoint { coordinates: *c }),
        );
    }

    pub fn current_step(&self) -> Option<RouteStep> {
        self.in_progress.first().copied()
    }

    /// The step after the current one.
    pub fn next_step(&self) -> Option<RouteStep> {
        match self.in_progress.len() {
            0 => None,
            1 => self.in_progress.first().copied(),
            _ => self.in_progress.get(1).copied(),
        }
    }

    /// Move the consumed head step to the tail.
    pub fn advance(&mut self) {
        if !self.in_progress.is_empty() {
            self.in_progress.rotate_left(1);
        }
    }

    /// Coordinates a step refers to.
    pub fn step_coordinates(&self, step: RouteStep) -> Option<Coordinates> {
        match step {
            RouteStep::Start => self.pickup(),
            RouteStep::End => self.dropoff(),
            RouteStep::Waypoint { coordinates } => Some(coordinates),
        }
    }
}
