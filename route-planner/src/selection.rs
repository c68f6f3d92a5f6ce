//! Point selection state machine.
//!
//! `Empty → OriginOnly → OriginAndDestination`, with an orthogonal
//! `stops_enabled` flag. The state machine only guards its own
//! invariants; cache invalidation and confirmation prompts belong to
//! the session controller.

use serde::Serialize;

use crate::domain::{Coordinates, Point, PointId};

/// Default maximum number of intermediate stops.
///
/// Origin + 5 stops + destination is the routing service's waypoint limit.
pub const DEFAULT_MAX_STOPS: usize = 5;

/// Rejected selection transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    /// A full origin/destination pair exists; it must be reset first.
    #[error("origin and destination are already set; reset the selection first")]
    ResetRequired,

    #[error("no origin selected")]
    OriginMissing,

    #[error("destination is already set")]
    DestinationAlreadySet,

    #[error("stops require both origin and destination")]
    DestinationMissing,

    #[error("stops are not enabled")]
    StopsDisabled,

    #[error("stop index {index} is out of bounds ({len} stops)")]
    StopIndexOutOfBounds { index: usize, len: usize },

    #[error("at most {max} stops are allowed")]
    TooManyStops { max: usize },
}

/// Which endpoints are selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    Empty,
    OriginOnly,
    OriginAndDestination,
}

/// A snapshot of the user's current choice of points.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Selection {
    pub origin: Option<Point>,
    pub destination: Option<Point>,
    pub stops: Vec<Point>,
    pub stops_enabled: bool,
}

impl Selection {
    pub fn phase(&self) -> SelectionPhase {
        match (&self.origin, &self.destination) {
            (None, _) => SelectionPhase::Empty,
            (Some(_), None) => SelectionPhase::OriginOnly,
            (Some(_), Some(_)) => SelectionPhase::OriginAndDestination,
        }
    }

    /// Origin, stops in order, destination. `None` until both endpoints exist.
    pub fn waypoints(&self) -> Option<Vec<Coordinates>> {
        let origin = self.origin.as_ref()?;
        let destination = self.destination.as_ref()?;

        let mut waypoints = Vec::with_capacity(self.stops.len() + 2);
        waypoints.push(origin.coordinates());
        waypoints.extend(self.stops.iter().map(Point::coordinates));
        waypoints.push(destination.coordinates());
        Some(waypoints)
    }

    /// Find a selected point by identity.
    pub fn find(&self, id: PointId) -> Option<&Point> {
        self.points().find(|p| p.id() == id)
    }

    /// All selected points: origin, stops, destination.
    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.origin
            .iter()
            .chain(self.stops.iter())
            .chain(self.destination.iter())
    }

    fn find_mut(&mut self, id: PointId) -> Option<&mut Point> {
        self.origin
            .iter_mut()
            .chain(self.stops.iter_mut())
            .chain(self.destination.iter_mut())
            .find(|p| p.id() == id)
    }
}

/// The mutable selection owned by a session.
#[derive(Debug, Clone)]
pub struct SelectionState {
    selection: Selection,
    next_id: u64,
    max_stops: usize,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_STOPS)
    }
}

impl SelectionState {
    pub fn new(max_stops: usize) -> Self {
        Self {
            selection: Selection::default(),
            next_id: 1,
            max_stops,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn phase(&self) -> SelectionPhase {
        self.selection.phase()
    }

    pub fn max_stops(&self) -> usize {
        self.max_stops
    }

    /// Allocate a new point with a fresh identity.
    pub fn create_point(&mut self, coordinates: Coordinates, display_name: Option<String>) -> Point {
        let id = PointId(self.next_id);
        self.next_id += 1;
        Point::new(id, coordinates, display_name)
    }

    /// Set or replace the origin while no destination exists.
    pub fn set_origin(&mut self, point: Point) -> Result<(), SelectionError> {
        if self.selection.destination.is_some() {
            return Err(SelectionError::ResetRequired);
        }
        self.selection.origin = Some(point);
        Ok(())
    }

    pub fn set_destination(&mut self, point: Point) -> Result<(), SelectionError> {
        match self.phase() {
            SelectionPhase::Empty => Err(SelectionError::OriginMissing),
            SelectionPhase::OriginAndDestination => Err(SelectionError::DestinationAlreadySet),
            SelectionPhase::OriginOnly => {
                self.selection.destination = Some(point);
                Ok(())
            }
        }
    }

    /// Append a stop; insertion order is traversal order.
    pub fn add_stop(&mut self, point: Point) -> Result<(), SelectionError> {
        if self.phase() != SelectionPhase::OriginAndDestination {
            return Err(SelectionError::DestinationMissing);
        }
        if !self.selection.stops_enabled {
            return Err(SelectionError::StopsDisabled);
        }
        if self.selection.stops.len() >= self.max_stops {
            return Err(SelectionError::TooManyStops {
                max: self.max_stops,
            });
        }
        self.selection.stops.push(point);
        Ok(())
    }

    pub fn remove_stop(&mut self, index: usize) -> Result<Point, SelectionError> {
        let len = self.selection.stops.len();
        if index >= len {
            return Err(SelectionError::StopIndexOutOfBounds { index, len });
        }
        Ok(self.selection.stops.remove(index))
    }

    /// Remove every stop, returning how many there were.
    pub fn clear_stops(&mut self) -> usize {
        let removed = self.selection.stops.len();
        self.selection.stops.clear();
        removed
    }

    /// Toggle stops. Disabling clears them; returns how many were removed.
    pub fn set_stops_enabled(&mut self, enabled: bool) -> usize {
        self.selection.stops_enabled = enabled;
        if enabled { 0 } else { self.clear_stops() }
    }

    /// Back to `Empty`. The stops toggle is a user preference and survives.
    pub fn reset(&mut self) {
        self.selection.origin = None;
        self.selection.destination = None;
        self.selection.stops.clear();
    }

    /// Patch a point's missing display name. Returns false if the point is
    /// gone or already named.
    pub fn back_fill_name(&mut self, id: PointId, name: String) -> bool {
        self.selection
            .find_mut(id)
            .is_some_and(|p| p.back_fill_name(name))
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        SetOrigin,
        SetDestination,
        AddStop,
        RemoveStop(usize),
        ClearStops,
        ToggleStops(bool),
        Reset,
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::SetOrigin),
            Just(Op::SetDestination),
            Just(Op::AddStop),
            (0usize..8).prop_map(Op::RemoveStop),
            Just(Op::ClearStops),
            any::<bool>().prop_map(Op::ToggleStops),
            Just(Op::Reset),
        ]
    }

    fn apply(state: &mut SelectionState, op: &Op, lat: f64) {
        let point = state.create_point(Coordinates::new(lat, 0.0).unwrap(), None);
        // Rejected transitions are expected; only the invariants matter here.
        let _ = match op {
            Op::SetOrigin => state.set_origin(point),
            Op::SetDestination => state.set_destination(point),
            Op::AddStop => state.add_stop(point),
            Op::RemoveStop(i) => state.remove_stop(*i).map(|_| ()),
            Op::ClearStops => {
                state.clear_stops();
                Ok(())
            }
            Op::ToggleStops(on) => {
                state.set_stops_enabled(*on);
                Ok(())
            }
            Op::Reset => {
                state.reset();
                Ok(())
            }
        };
    }

    proptest! {
        #[test]
        fn invariants_hold_after_every_operation(
            ops in prop::collection::vec((arb_op(), -80.0f64..80.0), 0..40)
        ) {
            let mut state = SelectionState::default();
            for (op, lat) in &ops {
                apply(&mut state, op, *lat);
                let sel = state.selection();

                prop_assert!(
                    sel.destination.is_none() || sel.origin.is_some(),
                    "destination without origin after {:?}", op
                );
                prop_assert!(
                    sel.stops.is_empty() || sel.stops_enabled,
                    "stops present while disabled after {:?}", op
                );
                prop_assert!(sel.stops.len() <= state.max_stops());
            }
        }

        #[test]
        fn add_then_remove_restores_stops(count in 0usize..4, lat in -80.0f64..80.0) {
            let mut state = SelectionState::default();
            let origin = state.create_point(Coordinates::new(0.0, 0.0).unwrap(), None);
            let destination = state.create_point(Coordinates::new(1.0, 1.0).unwrap(), None);
            state.set_origin(origin).unwrap();
            state.set_destination(destination).unwrap();
            state.set_stops_enabled(true);
            for i in 0..count {
                let p = state.create_point(Coordinates::new(i as f64, 2.0).unwrap(), None);
                state.add_stop(p).unwrap();
            }
            let before = state.selection().stops.clone();

            let p = state.create_point(Coordinates::new(lat, 3.0).unwrap(), None);
            state.add_stop(p).unwrap();
            state.remove_stop(count).unwrap();

            prop_assert_eq!(&state.selection().stops, &before);
        }
    }
}
