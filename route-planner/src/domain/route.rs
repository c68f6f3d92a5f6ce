//! Computed routes and turn-by-turn steps.

use chrono::Duration;
use serde::Serialize;

use super::{Coordinates, TransportMode};

/// Maneuver category of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Depart,
    Arrive,
    Turn,
    Straight,
}

/// Side of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

/// One instruction in a turn-by-turn breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    pub kind: StepKind,
    pub direction: Option<Direction>,
    pub instruction: String,
    pub distance_meters: Option<f64>,
}

impl Step {
    pub fn new(kind: StepKind, instruction: impl Into<String>) -> Self {
        Self {
            kind,
            direction: None,
            instruction: instruction.into(),
            distance_meters: None,
        }
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_distance(mut self, meters: f64) -> Self {
        self.distance_meters = Some(meters);
        self
    }
}

/// Route geometry as returned by a routing service, before it is tied to a mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteGeometry {
    pub path: Vec<Coordinates>,
    pub distance_meters: f64,
    pub node_count: usize,
    pub duration_seconds: Option<f64>,
}

/// A computed route for one transport mode.
///
/// Cached per mode and replaced wholesale on recomputation; only `steps`
/// is ever filled in after the fact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteResult {
    pub mode: TransportMode,
    pub path: Vec<Coordinates>,
    pub distance_meters: f64,
    pub node_count: usize,
    pub duration_seconds: Option<f64>,
    pub steps: Option<Vec<Step>>,
}

impl RouteResult {
    pub fn from_geometry(mode: TransportMode, geometry: RouteGeometry) -> Self {
        Self {
            mode,
            path: geometry.path,
            distance_meters: geometry.distance_meters,
            node_count: geometry.node_count,
            duration_seconds: geometry.duration_seconds,
            steps: None,
        }
    }

    /// Travel time estimated from distance and the mode's average speed.
    pub fn estimated_travel_time(&self) -> Duration {
        self.mode.estimated_travel_time(self.distance_meters)
    }

    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            mode: self.mode,
            distance_meters: self.distance_meters,
            node_count: self.node_count,
            estimated_travel_time: self.estimated_travel_time(),
        }
    }
}

/// One row of the mode comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub mode: TransportMode,
    pub distance_meters: f64,
    pub node_count: usize,
    pub estimated_travel_time: Duration,
}

/// Cost of inserting a candidate stop before the destination.
#[derive(Debug, Clone, PartialEq)]
pub struct DetourPreview {
    pub mode: TransportMode,
    pub base_distance_meters: f64,
    pub delta_distance_meters: f64,
    /// Present only when the service reported durations for both routes.
    pub delta_duration_seconds: Option<f64>,
    pub candidate: RouteGeometry,
}

impl DetourPreview {
    pub fn new(base: &RouteResult, candidate: RouteGeometry) -> Self {
        let delta_duration_seconds = match (base.duration_seconds, candidate.duration_seconds) {
            (Some(b), Some(c)) => Some(c - b),
            _ => None,
        };
        Self {
            mode: base.mode,
            base_distance_meters: base.distance_meters,
            delta_distance_meters: candidate.distance_meters - base.distance_meters,
            delta_duration_seconds,
            candidate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(lat: f64, lng: f64) -> Coordinates {
        Coordinates::new(lat, lng).unwrap()
    }

    fn geometry(distance: f64, duration: Option<f64>) -> RouteGeometry {
        RouteGeometry {
            path: vec![coords(-22.9186, -42.8197), coords(-22.92, -42.818)],
            distance_meters: distance,
            node_count: 2,
            duration_seconds: duration,
        }
    }

    #[test]
    fn from_geometry_keeps_values_verbatim() {
        let route = RouteResult::from_geometry(TransportMode::Walking, geometry(1234.5, Some(900.0)));
        assert_eq!(route.mode, TransportMode::Walking);
        assert_eq!(route.distance_meters, 1234.5);
        assert_eq!(route.node_count, 2);
        assert_eq!(route.path.len(), 2);
        assert!(route.steps.is_none());
    }

    #[test]
    fn summary_estimates_time() {
        let route = RouteResult::from_geometry(TransportMode::Driving, geometry(15_000.0, None));
        let summary = route.summary();
        assert_eq!(summary.estimated_travel_time, Duration::minutes(30));
        assert_eq!(summary.node_count, 2);
    }

    #[test]
    fn detour_deltas() {
        let base = RouteResult::from_geometry(TransportMode::Driving, geometry(1000.0, Some(120.0)));
        let preview = DetourPreview::new(&base, geometry(1600.0, Some(200.0)));
        assert_eq!(preview.delta_distance_meters, 600.0);
        assert_eq!(preview.delta_duration_seconds, Some(80.0));

        let preview = DetourPreview::new(&base, geometry(900.0, None));
        assert_eq!(preview.delta_distance_meters, -100.0);
        assert_eq!(preview.delta_duration_seconds, None);
    }

    #[test]
    fn step_builder() {
        let step = Step::new(StepKind::Turn, "Turn left")
            .with_direction(Direction::Left)
            .with_distance(42.0);
        assert_eq!(step.direction, Some(Direction::Left));
        assert_eq!(step.distance_meters, Some(42.0));
    }
}
