//! Domain types for the route planner.
//!
//! Points, transport modes and computed routes. Constructors validate
//! their inputs, so code receiving these types can trust their values.

mod format;
mod mode;
mod point;
mod route;

pub use format::{format_address, format_distance, format_travel_time};
pub use mode::{TransportMode, UnknownMode};
pub use point::{Coordinates, InvalidCoordinates, Place, Point, PointId};
pub use route::{
    DetourPreview, Direction, RouteGeometry, RouteResult, RouteSummary, Step, StepKind,
};
