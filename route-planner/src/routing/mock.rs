//! Offline routing client for development and tests.
//!
//! Serves OSRM-format responses loaded from JSON fixtures as if they
//! were live API responses. Requests are recorded, failures can be
//! injected, and responses can be held back until released so callers
//! can exercise out-of-order completions.

use std::collections::{HashMap, VecDeque};
use std::path::Path;

use tokio::sync::{Mutex, RwLock, Semaphore};

use crate::domain::{Coordinates, RouteGeometry, Step, TransportMode};
use crate::session::RouteClient;

use super::convert::{route_geometry, route_steps};
use super::error::RouteError;
use super::types::{LineString, Maneuver, OsrmLeg, OsrmResponse, OsrmRoute, OsrmStep};

/// Fixture key: mode, plus an optional exact waypoint count.
type FixtureKey = (TransportMode, Option<usize>);

/// Which client method a request came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Route,
    Steps,
}

/// A request seen by the mock, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub kind: RequestKind,
    pub mode: TransportMode,
    pub waypoints: Vec<Coordinates>,
}

/// Routing client backed by in-memory OSRM responses.
#[derive(Debug, Default)]
pub struct MockRouteClient {
    fixtures: RwLock<HashMap<FixtureKey, OsrmResponse>>,
    failures: Mutex<HashMap<TransportMode, VecDeque<String>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    gate: Option<Semaphore>,
    /// Only requests of this kind wait on the gate; `None` holds all.
    gated_kind: Option<RequestKind>,
}

impl MockRouteClient {
    /// A client with no fixtures; every request fails with `NoRoute`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load fixtures from a directory.
    ///
    /// Expects files named `{mode}.json` (e.g. `driving.json`), or
    /// `{mode}.{n}.json` to answer only requests with exactly `n` waypoints.
    pub fn new(data_dir: impl AsRef<Path>) -> Result<Self, RouteError> {
        Ok(Self {
            fixtures: RwLock::new(load_fixtures(data_dir.as_ref())?),
            ..Self::default()
        })
    }

    /// Serve `response` for every `mode` request.
    pub fn with_response(mut self, mode: TransportMode, response: OsrmResponse) -> Self {
        self.fixtures.get_mut().insert((mode, None), response);
        self
    }

    /// Serve `response` only for `mode` requests with `waypoints` waypoints.
    pub fn with_response_for(
        mut self,
        mode: TransportMode,
        waypoints: usize,
        response: OsrmResponse,
    ) -> Self {
        self.fixtures
            .get_mut()
            .insert((mode, Some(waypoints)), response);
        self
    }

    /// Serve a route following `path` with depart/arrive steps.
    pub fn with_route(self, mode: TransportMode, path: &[Coordinates], distance_meters: f64) -> Self {
        self.with_response(mode, straight_route(path, distance_meters))
    }

    /// Hold every response until [`release`](Self::release) is called.
    pub fn held(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    /// Hold only `kind` responses; the others answer immediately.
    pub fn held_for(mut self, kind: RequestKind) -> Self {
        self.gated_kind = Some(kind);
        self.held()
    }

    /// Let `n` held responses complete, in request order.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Make the next `mode` request fail with a 503.
    pub async fn fail_next(&self, mode: TransportMode, message: impl Into<String>) {
        self.failures
            .lock()
            .await
            .entry(mode)
            .or_default()
            .push_back(message.into());
    }

    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Number of recorded requests of `kind` for `mode`.
    pub async fn count(&self, kind: RequestKind, mode: TransportMode) -> usize {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|r| r.kind == kind && r.mode == mode)
            .count()
    }

    /// Reload fixtures from disk (useful for development).
    pub async fn reload(&self, data_dir: impl AsRef<Path>) -> Result<(), RouteError> {
        let fixtures = load_fixtures(data_dir.as_ref())?;
        *self.fixtures.write().await = fixtures;
        Ok(())
    }

    async fn respond(
        &self,
        kind: RequestKind,
        mode: TransportMode,
        waypoints: Vec<Coordinates>,
    ) -> Result<OsrmResponse, RouteError> {
        let count = waypoints.len();
        self.requests.lock().await.push(RecordedRequest {
            kind,
            mode,
            waypoints,
        });

        if let Some(gate) = &self.gate
            && self.gated_kind.is_none_or(|k| k == kind)
        {
            gate.acquire()
                .await
                .map_err(|_| RouteError::Fixture {
                    message: "response gate closed".to_string(),
                })?
                .forget();
        }

        if let Some(message) = self
            .failures
            .lock()
            .await
            .get_mut(&mode)
            .and_then(VecDeque::pop_front)
        {
            return Err(RouteError::Api {
                status: 503,
                message,
            });
        }

        let fixtures = self.fixtures.read().await;
        fixtures
            .get(&(mode, Some(count)))
            .or_else(|| fixtures.get(&(mode, None)))
            .cloned()
            .ok_or_else(|| RouteError::NoRoute(format!("no {mode} fixture")))
    }
}

impl RouteClient for MockRouteClient {
    async fn compute_route(
        &self,
        origin: &Coordinates,
        destination: &Coordinates,
        stops: &[Coordinates],
        mode: TransportMode,
    ) -> Result<RouteGeometry, RouteError> {
        let mut waypoints = vec![*origin];
        waypoints.extend_from_slice(stops);
        waypoints.push(*destination);

        let response = self.respond(RequestKind::Route, mode, waypoints).await?;
        route_geometry(&response)
    }

    async fn fetch_steps(
        &self,
        waypoints: &[Coordinates],
        mode: TransportMode,
    ) -> Result<Vec<Step>, RouteError> {
        let response = self
            .respond(RequestKind::Steps, mode, waypoints.to_vec())
            .await?;
        route_steps(&response)
    }
}

/// An OSRM response following `path`, with a single depart/arrive leg.
pub fn straight_route(path: &[Coordinates], distance_meters: f64) -> OsrmResponse {
    let step = |kind: &str, distance: f64| OsrmStep {
        name: String::new(),
        distance: Some(distance),
        duration: None,
        maneuver: Maneuver {
            kind: kind.to_string(),
            modifier: None,
        },
    };

    OsrmResponse {
        code: "Ok".to_string(),
        message: None,
        routes: vec![OsrmRoute {
            distance: distance_meters,
            duration: None,
            geometry: Some(LineString {
                coordinates: path
                    .iter()
                    .map(|c| vec![c.longitude, c.latitude])
                    .collect(),
            }),
            legs: vec![OsrmLeg {
                steps: vec![step("depart", distance_meters), step("arrive", 0.0)],
            }],
        }],
    }
}

fn fixture_key(stem: &str) -> Option<FixtureKey> {
    match stem.split_once('.') {
        None => Some((stem.parse().ok()?, None)),
        Some((mode, count)) => Some((mode.parse().ok()?, Some(count.parse().ok()?))),
    }
}

fn load_fixtures(data_dir: &Path) -> Result<HashMap<FixtureKey, OsrmResponse>, RouteError> {
    let mut fixtures = HashMap::new();

    let entries = std::fs::read_dir(data_dir).map_err(|e| RouteError::Fixture {
        message: format!("failed to read fixture directory {}: {e}", data_dir.display()),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| RouteError::Fixture {
            message: format!("failed to read directory entry: {e}"),
        })?;

        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }

        let Some(key) = path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(fixture_key)
        else {
            continue;
        };

        let json = std::fs::read_to_string(&path).map_err(|e| RouteError::Fixture {
            message: format!("failed to read {}: {e}", path.display()),
        })?;

        let response: OsrmResponse =
            serde_json::from_str(&json).map_err(|e| RouteError::Fixture {
                message: format!("failed to parse {}: {e}", path.display()),
            })?;

        fixtures.insert(key, response);
    }

    if fixtures.is_empty() {
        return Err(RouteError::Fixture {
            message: format!("no route fixtures found in {}", data_dir.display()),
        });
    }

    Ok(fixtures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn coords(lat: f64, lng: f64) -> Coordinates {
        Coordinates::new(lat, lng).unwrap()
    }

    fn path() -> Vec<Coordinates> {
        vec![coords(-22.9186, -42.8197), coords(-22.92, -42.818)]
    }

    fn write_fixture(dir: &Path, name: &str, distance: f64) {
        let json = serde_json::to_string(&straight_route(&path(), distance)).unwrap();
        std::fs::write(dir.join(name), json).unwrap();
    }

    #[test]
    fn fixture_names() {
        assert_eq!(fixture_key("driving"), Some((TransportMode::Driving, None)));
        assert_eq!(fixture_key("walking.3"), Some((TransportMode::Walking, Some(3))));
        assert_eq!(fixture_key("notes"), None);
        assert_eq!(fixture_key("cycling.x"), None);
    }

    #[tokio::test]
    async fn loads_fixtures_from_directory() {
        let dir = tempdir().unwrap();
        write_fixture(dir.path(), "driving.json", 1500.0);
        write_fixture(dir.path(), "driving.3.json", 2100.0);
        std::fs::write(dir.path().join("README.txt"), "ignored").unwrap();

        let client = MockRouteClient::new(dir.path()).unwrap();
        let [a, b] = [path()[0], path()[1]];

        let direct = client
            .compute_route(&a, &b, &[], TransportMode::Driving)
            .await
            .unwrap();
        assert_eq!(direct.distance_meters, 1500.0);

        let via = client
            .compute_route(&a, &b, &[coords(-22.91, -42.81)], TransportMode::Driving)
            .await
            .unwrap();
        assert_eq!(via.distance_meters, 2100.0);

        assert!(matches!(
            client.compute_route(&a, &b, &[], TransportMode::Cycling).await,
            Err(RouteError::NoRoute(_))
        ));
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            MockRouteClient::new(dir.path()),
            Err(RouteError::Fixture { .. })
        ));
    }

    #[test]
    fn malformed_fixture_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("walking.json"), "{not json").unwrap();
        assert!(matches!(
            MockRouteClient::new(dir.path()),
            Err(RouteError::Fixture { .. })
        ));
    }

    #[tokio::test]
    async fn records_requests_and_serves_steps() {
        let client = MockRouteClient::empty().with_route(TransportMode::Walking, &path(), 800.0);
        let wps = path();

        let steps = client.fetch_steps(&wps, TransportMode::Walking).await.unwrap();
        assert_eq!(steps.len(), 2);

        let requests = client.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].kind, RequestKind::Steps);
        assert_eq!(requests[0].waypoints, wps);
    }

    #[tokio::test]
    async fn injected_failure_applies_once() {
        let client = MockRouteClient::empty().with_route(TransportMode::Driving, &path(), 800.0);
        client.fail_next(TransportMode::Driving, "upstream down").await;
        let [a, b] = [path()[0], path()[1]];

        let first = client.compute_route(&a, &b, &[], TransportMode::Driving).await;
        assert!(matches!(first, Err(RouteError::Api { status: 503, .. })));

        let second = client.compute_route(&a, &b, &[], TransportMode::Driving).await;
        assert!(second.is_ok());
        assert_eq!(client.count(RequestKind::Route, TransportMode::Driving).await, 2);
    }

    #[tokio::test]
    async fn held_responses_wait_for_release() {
        let client = MockRouteClient::empty()
            .with_route(TransportMode::Driving, &path(), 800.0)
            .held();
        let [a, b] = [path()[0], path()[1]];

        let (result, ()) = tokio::join!(
            client.compute_route(&a, &b, &[], TransportMode::Driving),
            async {
                tokio::task::yield_now().await;
                assert_eq!(client.request_count().await, 1);
                client.release(1);
            }
        );
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn held_for_gates_one_kind() {
        let client = MockRouteClient::empty()
            .with_route(TransportMode::Driving, &path(), 800.0)
            .held_for(RequestKind::Steps);
        let wps = vec![path()[0], path()[1]];

        let (steps, route) = tokio::join!(
            client.fetch_steps(&wps, TransportMode::Driving),
            async {
                let route = client
                    .compute_route(&wps[0], &wps[1], &[], TransportMode::Driving)
                    .await;
                client.release(1);
                route
            }
        );
        assert!(route.is_ok());
        assert!(steps.is_ok());
    }
}
