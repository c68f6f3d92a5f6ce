//! Routing service clients.
//!
//! Route geometry and turn-by-turn steps come from an OSRM server:
//! - Waypoints are sent as `lng,lat` pairs, origin first, destination last
//! - The public server accepts at most 7 waypoints per request
//! - Routing failures come back as a non-`Ok` `code`, not only as HTTP errors
//!
//! [`MockRouteClient`] serves the same wire format from fixture files.

mod client;
mod convert;
mod error;
mod mock;
mod types;

pub use client::{DEFAULT_BASE_URL, DEFAULT_MAX_WAYPOINTS, OsrmClient, OsrmConfig};
pub use convert::{encode_waypoints, route_geometry, route_steps};
pub use error::RouteError;
pub use mock::{MockRouteClient, RecordedRequest, RequestKind, straight_route};
pub use types::{LineString, Maneuver, OsrmLeg, OsrmResponse, OsrmRoute, OsrmStep};
