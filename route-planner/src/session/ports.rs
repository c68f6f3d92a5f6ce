//! Capabilities the session consumes and the notifications it emits.

use crate::domain::{Coordinates, Place, RouteGeometry, Step, TransportMode};
use crate::geocoding::GeocodeError;
use crate::routing::RouteError;

use super::events::SessionEvent;

/// Remote route computation.
///
/// This trait abstracts over the real OSRM client and the offline
/// fixture client. The session treats it as a black box.
///
/// Futures are not required to be `Send`; a session is driven from one task.
#[allow(async_fn_in_trait)]
pub trait RouteClient {
    /// Compute a route from `origin` through `stops` (in order) to `destination`.
    async fn compute_route(
        &self,
        origin: &Coordinates,
        destination: &Coordinates,
        stops: &[Coordinates],
        mode: TransportMode,
    ) -> Result<RouteGeometry, RouteError>;

    /// Turn-by-turn steps along `waypoints` (origin, stops, destination).
    async fn fetch_steps(
        &self,
        waypoints: &[Coordinates],
        mode: TransportMode,
    ) -> Result<Vec<Step>, RouteError>;
}

/// Free-text and reverse geocoding.
#[allow(async_fn_in_trait)]
pub trait GeocodeClient {
    /// Resolve free text, or a `"lat, lng"` string for reverse lookup.
    async fn resolve(&self, query: &str) -> Result<Place, GeocodeError>;
}

/// Receiver of session notifications. Fire-and-forget.
pub trait PresentationPort {
    fn notify(&self, event: SessionEvent);
}
