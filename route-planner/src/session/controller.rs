//! The planning session: selection, route cache and client orchestration.
//!
//! All mutable state sits behind one async mutex. The lock is taken for
//! each synchronous step and released before any client call, so several
//! operations on one controller may be in flight at once. A route request
//! captures the cache generation in the same critical section that read
//! its waypoints; its response is committed only if that generation is
//! still current.

use std::collections::HashMap;

use futures::future::join_all;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::cache::{Generation, RouteCache};
use crate::domain::{
    Coordinates, DetourPreview, PointId, RouteResult, RouteSummary, Step, TransportMode,
    format_address,
};
use crate::geocoding::GeocodeError;
use crate::routing::RouteError;
use crate::selection::{Selection, SelectionError, SelectionPhase, SelectionState};

use super::config::SessionConfig;
use super::events::SessionEvent;
use super::ports::{GeocodeClient, PresentationPort, RouteClient};

/// Usage errors surfaced to the caller. Client failures never appear here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("origin and destination must both be selected")]
    IncompleteSelection,

    #[error("no {0} route has been computed for the current selection")]
    RouteNotCached(TransportMode),

    #[error(transparent)]
    Selection(#[from] SelectionError),
}

/// How a selected point should be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointRole {
    /// Origin, then destination, then stops if enabled.
    #[default]
    Auto,
    /// Always an intermediate stop.
    Stop,
}

/// Coarse session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Empty,
    OriginOnly,
    /// Origin and destination set; routes can be computed.
    Ready,
}

impl From<SelectionPhase> for SessionPhase {
    fn from(phase: SelectionPhase) -> Self {
        match phase {
            SelectionPhase::Empty => SessionPhase::Empty,
            SelectionPhase::OriginOnly => SessionPhase::OriginOnly,
            SelectionPhase::OriginAndDestination => SessionPhase::Ready,
        }
    }
}

/// Result of a route computation attempt.
#[derive(Debug)]
pub enum RouteOutcome {
    /// Computed and installed in the cache.
    Ready(RouteResult),
    /// Served from the cache without a request.
    Cached(RouteResult),
    /// A request for this mode and selection is already pending.
    Pending,
    /// The selection changed while the request was in flight; discarded.
    Stale,
    /// The routing service failed; the cache is untouched.
    Failed(RouteError),
    /// Nothing to compute: origin or destination missing.
    NotRequested,
}

impl RouteOutcome {
    /// The route, if this outcome produced one.
    pub fn route(&self) -> Option<&RouteResult> {
        match self {
            RouteOutcome::Ready(route) | RouteOutcome::Cached(route) => Some(route),
            _ => None,
        }
    }
}

/// Result of selecting a point.
#[derive(Debug)]
pub enum SelectOutcome {
    OriginSet(PointId),
    DestinationSet { point: PointId, route: RouteOutcome },
    StopAdded { point: PointId, route: RouteOutcome },
    /// A full pair exists and stops are off; nothing changed. Follow up
    /// with [`SessionController::reset_and_select`] once confirmed.
    ConfirmationRequired,
    /// Free-text query could not be resolved; nothing changed.
    Unresolved(GeocodeError),
}

impl SelectOutcome {
    pub fn point(&self) -> Option<PointId> {
        match self {
            SelectOutcome::OriginSet(point)
            | SelectOutcome::DestinationSet { point, .. }
            | SelectOutcome::StopAdded { point, .. } => Some(*point),
            SelectOutcome::ConfirmationRequired | SelectOutcome::Unresolved(_) => None,
        }
    }
}

#[derive(Debug)]
pub enum StepsOutcome {
    Ready(Vec<Step>),
    /// Soft failure; the route stays usable without steps.
    Unavailable(RouteError),
    /// The route was invalidated before the steps arrived.
    Stale,
}

#[derive(Debug)]
pub enum GeocodeOutcome {
    /// The point now carries this name.
    Named(String),
    /// The point already had a name, which is kept.
    AlreadyNamed,
    /// The point is no longer part of the selection.
    Discarded,
    /// Lookup failed; the point stays unnamed.
    Unavailable(GeocodeError),
}

#[derive(Debug)]
pub enum PreviewOutcome {
    Ready(DetourPreview),
    Failed(RouteError),
    Stale,
}

/// Everything a route request needs, captured atomically.
#[derive(Debug)]
struct RouteRequest {
    mode: TransportMode,
    origin: Coordinates,
    destination: Coordinates,
    stops: Vec<Coordinates>,
    generation: Generation,
    /// Keeps the request registered as pending until dropped, whether it
    /// completes or its future is cancelled.
    _pending: Option<watch::Sender<()>>,
}

/// A registered request: its generation, and a receiver that closes once
/// the request is gone.
#[derive(Debug)]
struct Pending {
    generation: Generation,
    done: watch::Receiver<()>,
}

impl Pending {
    fn is_live(&self) -> bool {
        self.done.has_changed().is_ok()
    }
}

#[derive(Debug)]
struct SessionState {
    selection: SelectionState,
    cache: RouteCache,
    active_mode: TransportMode,
    in_flight: HashMap<TransportMode, Vec<Pending>>,
}

impl SessionState {
    /// Capture a request for `mode` against the current selection without
    /// registering it. `None` unless origin and destination are set.
    fn capture(&self, mode: TransportMode) -> Option<RouteRequest> {
        let selection = self.selection.selection();
        let origin = selection.origin.as_ref()?.coordinates();
        let destination = selection.destination.as_ref()?.coordinates();
        let stops = selection.stops.iter().map(|p| p.coordinates()).collect();

        Some(RouteRequest {
            mode,
            origin,
            destination,
            stops,
            generation: self.cache.generation(),
            _pending: None,
        })
    }

    /// Capture a request for `mode` and mark it in flight until the
    /// request is dropped.
    fn begin_request(&mut self, mode: TransportMode) -> Option<RouteRequest> {
        let request = self.capture(mode)?;
        let (tx, done) = watch::channel(());

        let pending = self.in_flight.entry(mode).or_default();
        pending.retain(Pending::is_live);
        pending.push(Pending {
            generation: request.generation,
            done,
        });
        Some(RouteRequest {
            _pending: Some(tx),
            ..request
        })
    }

    /// The live request for `mode` at the current generation, if any.
    fn pending(&self, mode: TransportMode) -> Option<&Pending> {
        let generation = self.cache.generation();
        self.in_flight
            .get(&mode)?
            .iter()
            .find(|p| p.generation == generation && p.is_live())
    }

    fn is_pending(&self, mode: TransportMode) -> bool {
        self.pending(mode).is_some()
    }

    fn snapshot(&self) -> Selection {
        self.selection.selection().clone()
    }
}

/// Owns one user's selection and route cache and drives the clients.
pub struct SessionController<R, G, P> {
    routes: R,
    geocoder: G,
    presenter: P,
    state: Mutex<SessionState>,
}

impl<R, G, P> SessionController<R, G, P>
where
    R: RouteClient,
    G: GeocodeClient,
    P: PresentationPort,
{
    pub fn new(routes: R, geocoder: G, presenter: P, config: SessionConfig) -> Self {
        Self {
            routes,
            geocoder,
            presenter,
            state: Mutex::new(SessionState {
                selection: SelectionState::new(config.max_stops),
                cache: RouteCache::new(),
                active_mode: config.default_mode,
                in_flight: HashMap::new(),
            }),
        }
    }

    pub fn route_client(&self) -> &R {
        &self.routes
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Select a point at `coordinates`.
    ///
    /// With [`PointRole::Auto`] the first point becomes the origin, the
    /// second the destination (and the active mode is computed), later
    /// ones stops when enabled. Otherwise confirmation is requested and
    /// nothing changes.
    pub async fn select_point(
        &self,
        role: PointRole,
        coordinates: Coordinates,
    ) -> Result<SelectOutcome, SessionError> {
        self.select(role, coordinates, None).await
    }

    /// Resolve `query` through the geocoder, then select the result.
    ///
    /// The resolved address, shortened for display, becomes the point's
    /// name.
    pub async fn select_place(
        &self,
        role: PointRole,
        query: &str,
    ) -> Result<SelectOutcome, SessionError> {
        let place = match self.geocoder.resolve(query).await {
            Ok(place) => place,
            Err(e) => {
                info!(%query, error = %e, "could not resolve place");
                return Ok(SelectOutcome::Unresolved(e));
            }
        };

        let name = format_address(&place.display_name);
        self.select(role, place.coordinates, Some(name)).await
    }

    async fn select(
        &self,
        role: PointRole,
        coordinates: Coordinates,
        name: Option<String>,
    ) -> Result<SelectOutcome, SessionError> {
        let mut state = self.state.lock().await;

        let (point, request, is_stop) = match (role, state.selection.phase()) {
            (PointRole::Auto, SelectionPhase::Empty) => {
                let point = state.selection.create_point(coordinates, name);
                let id = point.id();
                state.selection.set_origin(point)?;
                self.commit_mutation(&mut state);
                debug!(%id, %coordinates, "origin set");
                return Ok(SelectOutcome::OriginSet(id));
            }
            (PointRole::Auto, SelectionPhase::OriginOnly) => {
                let point = state.selection.create_point(coordinates, name);
                let id = point.id();
                state.selection.set_destination(point)?;
                let request = self.commit_and_begin(&mut state);
                debug!(%id, %coordinates, "destination set");
                (id, request, false)
            }
            (PointRole::Auto, SelectionPhase::OriginAndDestination)
                if !state.selection.selection().stops_enabled =>
            {
                debug!(%coordinates, "full pair selected, asking for confirmation");
                self.presenter.notify(SessionEvent::ConfirmationRequired);
                return Ok(SelectOutcome::ConfirmationRequired);
            }
            (PointRole::Auto | PointRole::Stop, _) => {
                let point = state.selection.create_point(coordinates, name);
                let id = point.id();
                state.selection.add_stop(point)?;
                let request = self.commit_and_begin(&mut state);
                debug!(%id, %coordinates, "stop added");
                (id, request, true)
            }
        };
        drop(state);

        let route = self.run_optional(request).await;
        Ok(if is_stop {
            SelectOutcome::StopAdded { point, route }
        } else {
            SelectOutcome::DestinationSet { point, route }
        })
    }

    /// Start over with a new origin. Used once the user has confirmed
    /// replacing a full selection.
    pub async fn reset_and_select(&self, coordinates: Coordinates) -> Result<PointId, SessionError> {
        let mut state = self.state.lock().await;
        state.selection.reset();
        let point = state.selection.create_point(coordinates, None);
        let id = point.id();
        state.selection.set_origin(point)?;
        self.commit_mutation(&mut state);
        info!(%id, "selection restarted");
        Ok(id)
    }

    /// Switch the active mode, serving a cached route or computing one.
    pub async fn set_active_mode(&self, mode: TransportMode) -> RouteOutcome {
        let mut state = self.state.lock().await;
        state.active_mode = mode;

        if let Some(route) = state.cache.get(mode).cloned() {
            debug!(%mode, "serving cached route");
            self.presenter.notify(SessionEvent::RouteReady {
                mode,
                route: route.clone(),
            });
            return RouteOutcome::Cached(route);
        }
        if state.is_pending(mode) {
            return RouteOutcome::Pending;
        }
        let request = state.begin_request(mode);
        drop(state);

        self.run_optional(request).await
    }

    /// Compute `mode` for the current selection, whether cached or not.
    pub async fn compute_route(&self, mode: TransportMode) -> Result<RouteOutcome, SessionError> {
        let request = self
            .state
            .lock()
            .await
            .begin_request(mode)
            .ok_or(SessionError::IncompleteSelection)?;
        Ok(self.run_request(request).await)
    }

    /// Compute what the view currently needs: the active mode only.
    /// Other modes are computed when switched to.
    pub async fn compute_all_relevant_modes(&self) -> Result<RouteOutcome, SessionError> {
        let mut state = self.state.lock().await;
        let mode = state.active_mode;
        if let Some(route) = state.cache.get(mode) {
            return Ok(RouteOutcome::Cached(route.clone()));
        }
        let request = state
            .begin_request(mode)
            .ok_or(SessionError::IncompleteSelection)?;
        drop(state);

        Ok(self.run_request(request).await)
    }

    /// Fetch turn-by-turn steps for the cached `mode` route.
    pub async fn fetch_steps(&self, mode: TransportMode) -> Result<StepsOutcome, SessionError> {
        let (waypoints, generation) = {
            let state = self.state.lock().await;
            if !state.cache.contains(mode) {
                return Err(SessionError::RouteNotCached(mode));
            }
            let waypoints = state
                .selection
                .selection()
                .waypoints()
                .ok_or(SessionError::IncompleteSelection)?;
            (waypoints, state.cache.generation())
        };

        let result = self.routes.fetch_steps(&waypoints, mode).await;

        let mut state = self.state.lock().await;
        if state.cache.generation() != generation {
            debug!(%mode, "discarding steps for a stale selection");
            return Ok(StepsOutcome::Stale);
        }
        match result {
            Ok(steps) => {
                if !state.cache.attach_steps(mode, steps.clone()) {
                    return Ok(StepsOutcome::Stale);
                }
                self.presenter.notify(SessionEvent::StepsReady {
                    mode,
                    steps: steps.clone(),
                });
                Ok(StepsOutcome::Ready(steps))
            }
            Err(e) => {
                info!(%mode, error = %e, "steps unavailable");
                self.presenter
                    .notify(SessionEvent::StepsUnavailable { mode });
                Ok(StepsOutcome::Unavailable(e))
            }
        }
    }

    /// Look up an address for `point` and give it a name if it has none.
    pub async fn reverse_geocode(&self, point: PointId) -> GeocodeOutcome {
        let query = {
            let state = self.state.lock().await;
            match state.selection.selection().find(point) {
                None => return GeocodeOutcome::Discarded,
                Some(p) if p.display_name().is_some() => return GeocodeOutcome::AlreadyNamed,
                Some(p) => p.coordinates().to_query(),
            }
        };

        let place = match self.geocoder.resolve(&query).await {
            Ok(place) => place,
            Err(e) => {
                debug!(%point, error = %e, "reverse geocoding failed");
                return GeocodeOutcome::Unavailable(e);
            }
        };
        let name = format_address(&place.display_name);

        let mut state = self.state.lock().await;
        if state.selection.back_fill_name(point, name.clone()) {
            self.presenter
                .notify(SessionEvent::SelectionChanged(state.snapshot()));
            GeocodeOutcome::Named(name)
        } else if state.selection.selection().find(point).is_some() {
            GeocodeOutcome::AlreadyNamed
        } else {
            debug!(%point, "point removed before its name arrived");
            GeocodeOutcome::Discarded
        }
    }

    /// Remove the stop at `index` and recompute the active mode.
    pub async fn remove_stop(&self, index: usize) -> Result<RouteOutcome, SessionError> {
        let mut state = self.state.lock().await;
        let removed = state.selection.remove_stop(index)?;
        debug!(id = %removed.id(), index, "stop removed");
        let request = self.commit_and_begin(&mut state);
        drop(state);

        Ok(self.run_optional(request).await)
    }

    pub async fn clear_stops(&self) -> RouteOutcome {
        let mut state = self.state.lock().await;
        let removed = state.selection.clear_stops();
        debug!(removed, "stops cleared");
        let request = self.commit_and_begin(&mut state);
        drop(state);

        self.run_optional(request).await
    }

    /// Toggle stops. Disabling drops any existing stops, which triggers a
    /// recompute.
    pub async fn set_stops_enabled(&self, enabled: bool) -> RouteOutcome {
        let mut state = self.state.lock().await;
        let removed = state.selection.set_stops_enabled(enabled);

        if removed == 0 {
            self.presenter
                .notify(SessionEvent::SelectionChanged(state.snapshot()));
            return RouteOutcome::NotRequested;
        }

        debug!(removed, "stops disabled");
        let request = self.commit_and_begin(&mut state);
        drop(state);

        self.run_optional(request).await
    }

    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.selection.reset();
        self.commit_mutation(&mut state);
        info!("selection reset");
    }

    /// Compute every mode missing from the cache concurrently and compare
    /// all three.
    ///
    /// A mode already being computed for this selection is waited for, not
    /// requested again. Modes whose computation failed or went stale are
    /// left out.
    pub async fn compare_modes(&self) -> Result<Vec<RouteSummary>, SessionError> {
        let (requests, waiting) = {
            let mut state = self.state.lock().await;
            if state.selection.selection().waypoints().is_none() {
                return Err(SessionError::IncompleteSelection);
            }
            let mut requests = Vec::new();
            let mut waiting = Vec::new();
            for mode in TransportMode::ALL {
                if state.cache.contains(mode) {
                    continue;
                }
                if let Some(pending) = state.pending(mode) {
                    waiting.push(pending.done.clone());
                } else if let Some(request) = state.begin_request(mode) {
                    requests.push(request);
                }
            }
            (requests, waiting)
        };

        debug!(
            count = requests.len(),
            waiting = waiting.len(),
            "comparing modes"
        );
        tokio::join!(
            join_all(requests.into_iter().map(|r| self.run_request(r))),
            join_all(waiting.into_iter().map(|mut done| async move {
                // Never sent on; resolves once the request is dropped.
                while done.changed().await.is_ok() {}
            }))
        );

        let state = self.state.lock().await;
        Ok(TransportMode::ALL
            .into_iter()
            .filter_map(|mode| state.cache.get(mode).map(RouteResult::summary))
            .collect())
    }

    /// Price a candidate stop appended after the existing stops, without
    /// touching the selection or the cache.
    pub async fn preview_stop(
        &self,
        candidate: Coordinates,
        mode: TransportMode,
    ) -> Result<PreviewOutcome, SessionError> {
        let mut request = {
            let mut state = self.state.lock().await;
            if !state.cache.contains(mode) {
                return Err(SessionError::RouteNotCached(mode));
            }
            let max = state.selection.max_stops();
            if state.selection.selection().stops.len() >= max {
                return Err(SelectionError::TooManyStops { max }.into());
            }
            state
                .capture(mode)
                .ok_or(SessionError::IncompleteSelection)?
        };
        request.stops.push(candidate);

        let result = self
            .routes
            .compute_route(&request.origin, &request.destination, &request.stops, mode)
            .await;

        let state = self.state.lock().await;
        let base = match state.cache.get(mode) {
            Some(base) if state.cache.generation() == request.generation => base,
            _ => return Ok(PreviewOutcome::Stale),
        };

        Ok(match result {
            Ok(geometry) => {
                let preview = DetourPreview::new(base, geometry);
                debug!(%mode, delta = preview.delta_distance_meters, "detour previewed");
                PreviewOutcome::Ready(preview)
            }
            Err(e) => PreviewOutcome::Failed(e),
        })
    }

    pub async fn snapshot(&self) -> Selection {
        self.state.lock().await.snapshot()
    }

    pub async fn active_mode(&self) -> TransportMode {
        self.state.lock().await.active_mode
    }

    pub async fn phase(&self) -> SessionPhase {
        self.state.lock().await.selection.phase().into()
    }

    /// Number of route requests for `mode` awaiting a response.
    pub async fn in_flight(&self, mode: TransportMode) -> usize {
        self.state
            .lock()
            .await
            .in_flight
            .get(&mode)
            .map_or(0, |pending| pending.iter().filter(|p| p.is_live()).count())
    }

    pub async fn cached_route(&self, mode: TransportMode) -> Option<RouteResult> {
        self.state.lock().await.cache.get(mode).cloned()
    }

    pub async fn generation(&self) -> Generation {
        self.state.lock().await.cache.generation()
    }

    /// Invalidate the cache after a selection change and announce it.
    fn commit_mutation(&self, state: &mut SessionState) {
        let generation = state.cache.invalidate_all();
        debug!(generation, "route cache invalidated");
        self.presenter
            .notify(SessionEvent::SelectionChanged(state.snapshot()));
    }

    /// As [`commit_mutation`](Self::commit_mutation), then capture a
    /// request for the active mode against the new selection.
    fn commit_and_begin(&self, state: &mut SessionState) -> Option<RouteRequest> {
        self.commit_mutation(state);
        let mode = state.active_mode;
        state.begin_request(mode)
    }

    async fn run_optional(&self, request: Option<RouteRequest>) -> RouteOutcome {
        match request {
            Some(request) => self.run_request(request).await,
            None => RouteOutcome::NotRequested,
        }
    }

    async fn run_request(&self, request: RouteRequest) -> RouteOutcome {
        let mode = request.mode;
        debug!(
            %mode,
            generation = request.generation,
            stops = request.stops.len(),
            "requesting route"
        );

        let result = self
            .routes
            .compute_route(&request.origin, &request.destination, &request.stops, mode)
            .await;

        let mut state = self.state.lock().await;

        match result {
            Ok(geometry) => {
                let route = RouteResult::from_geometry(mode, geometry);
                if !state.cache.put(mode, route.clone(), request.generation) {
                    debug!(%mode, generation = request.generation, "discarding stale route");
                    return RouteOutcome::Stale;
                }
                info!(%mode, distance = route.distance_meters, nodes = route.node_count, "route ready");
                self.presenter.notify(SessionEvent::RouteReady {
                    mode,
                    route: route.clone(),
                });
                RouteOutcome::Ready(route)
            }
            Err(e) if state.cache.generation() != request.generation => {
                debug!(%mode, error = %e, "ignoring failure for a stale selection");
                RouteOutcome::Stale
            }
            Err(e) => {
                warn!(%mode, error = %e, "route computation failed");
                self.presenter.notify(SessionEvent::RouteFailed {
                    mode,
                    reason: e.to_string(),
                });
                RouteOutcome::Failed(e)
            }
        }
    }
}
