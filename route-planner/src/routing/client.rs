//! OSRM HTTP client.
//!
//! Issues `route/v1` requests against a public or self-hosted OSRM
//! server and converts the responses to domain types.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::{Coordinates, RouteGeometry, Step, TransportMode};
use crate::session::RouteClient;

use super::convert::{encode_waypoints, route_geometry, route_steps};
use super::error::RouteError;
use super::types::OsrmResponse;

/// Default OSRM server (the public demo instance).
pub const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org";

/// Origin + 5 stops + destination.
pub const DEFAULT_MAX_WAYPOINTS: usize = 7;

/// One in-flight request per transport mode.
const DEFAULT_MAX_CONCURRENT: usize = 3;

const DEFAULT_USER_AGENT: &str = concat!("route-planner/", env!("CARGO_PKG_VERSION"));

/// Configuration for the OSRM client.
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    /// Server base URL, without trailing slash
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Maximum waypoints per request, endpoints included
    pub max_waypoints: usize,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    pub user_agent: String,
}

impl OsrmConfig {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 12,
            max_waypoints: DEFAULT_MAX_WAYPOINTS,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Set a custom base URL (self-hosted server or tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_max_waypoints(mut self, n: usize) -> Self {
        self.max_waypoints = n;
        self
    }

    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// OSRM routing client.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    http: reqwest::Client,
    base_url: String,
    max_waypoints: usize,
    semaphore: Arc<Semaphore>,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, RouteError> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&config.user_agent).map_err(|_| RouteError::Api {
            status: 0,
            message: "Invalid user agent".to_string(),
        })?;
        headers.insert(USER_AGENT, agent);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            max_waypoints: config.max_waypoints,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
        })
    }

    fn route_url(&self, mode: TransportMode, waypoints: &[Coordinates], steps: bool) -> String {
        format!(
            "{}/route/v1/{}/{}?overview=full&geometries=geojson&steps={}",
            self.base_url,
            mode.as_str(),
            encode_waypoints(waypoints),
            steps
        )
    }

    fn check_waypoints(&self, waypoints: &[Coordinates]) -> Result<(), RouteError> {
        let count = waypoints.len();
        if count < 2 {
            return Err(RouteError::TooFewWaypoints { count });
        }
        if count > self.max_waypoints {
            return Err(RouteError::TooManyWaypoints {
                count,
                max: self.max_waypoints,
            });
        }
        Ok(())
    }

    /// Issue one `route` request and return the raw response.
    pub async fn route(
        &self,
        mode: TransportMode,
        waypoints: &[Coordinates],
        steps: bool,
    ) -> Result<OsrmResponse, RouteError> {
        self.check_waypoints(waypoints)?;

        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| RouteError::Api {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let url = self.route_url(mode, waypoints, steps);
        debug!(%mode, waypoints = waypoints.len(), steps, "requesting OSRM route");

        let response = self.http.get(&url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RouteError::RateLimited);
        }

        let body = response.text().await?;

        // OSRM reports routing failures (NoRoute, NoSegment, ...) as 400 with a JSON body
        if status == reqwest::StatusCode::BAD_REQUEST
            && let Ok(parsed) = serde_json::from_str::<OsrmResponse>(&body)
        {
            return Ok(parsed);
        }

        if !status.is_success() {
            return Err(RouteError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        serde_json::from_str(&body).map_err(|e| RouteError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })
    }
}

impl RouteClient for OsrmClient {
    async fn compute_route(
        &self,
        origin: &Coordinates,
        destination: &Coordinates,
        stops: &[Coordinates],
        mode: TransportMode,
    ) -> Result<RouteGeometry, RouteError> {
        let mut waypoints = Vec::with_capacity(stops.len() + 2);
        waypoints.push(*origin);
        waypoints.extend_from_slice(stops);
        waypoints.push(*destination);

        let response = self.route(mode, &waypoints, false).await?;
        route_geometry(&response)
    }

    async fn fetch_steps(
        &self,
        waypoints: &[Coordinates],
        mode: TransportMode,
    ) -> Result<Vec<Step>, RouteError> {
        let response = self.route(mode, waypoints, true).await?;
        route_steps(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(lat: f64, lng: f64) -> Coordinates {
        Coordinates::new(lat, lng).unwrap()
    }

    #[test]
    fn config_builder() {
        let config = OsrmConfig::new()
            .with_base_url("http://localhost:5000/")
            .with_timeout(30)
            .with_max_waypoints(10)
            .with_max_concurrent(1)
            .with_user_agent("test-agent");

        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_waypoints, 10);
        assert_eq!(config.max_concurrent, 1);
        assert_eq!(config.user_agent, "test-agent");
    }

    #[test]
    fn config_defaults() {
        let config = OsrmConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 12);
        assert_eq!(config.max_waypoints, DEFAULT_MAX_WAYPOINTS);
    }

    #[test]
    fn client_creation() {
        assert!(OsrmClient::new(OsrmConfig::default()).is_ok());
    }

    #[test]
    fn route_url_shape() {
        let client = OsrmClient::new(OsrmConfig::new().with_base_url("http://osrm.test")).unwrap();
        let url = client.route_url(
            TransportMode::Walking,
            &[coords(-22.9186, -42.8197), coords(-22.92, -42.818)],
            true,
        );
        assert_eq!(
            url,
            "http://osrm.test/route/v1/walking/-42.8197,-22.9186;-42.818,-22.92?overview=full&geometries=geojson&steps=true"
        );
    }

    #[tokio::test]
    async fn waypoint_limits_checked_before_request() {
        // Unroutable base URL: the request must never be attempted.
        let client = OsrmClient::new(OsrmConfig::new().with_base_url("http://127.0.0.1:9")).unwrap();

        let one = [coords(0.0, 0.0)];
        assert!(matches!(
            client.route(TransportMode::Driving, &one, false).await,
            Err(RouteError::TooFewWaypoints { count: 1 })
        ));

        let eight = vec![coords(0.0, 0.0); 8];
        assert!(matches!(
            client.route(TransportMode::Driving, &eight, false).await,
            Err(RouteError::TooManyWaypoints { count: 8, max: 7 })
        ));
    }

    // Live requests against an OSRM server would go here, marked
    // #[ignore] since they need network access.
}
