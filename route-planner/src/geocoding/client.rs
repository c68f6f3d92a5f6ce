//! Nominatim geocoding client.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::domain::{Coordinates, Place};
use crate::session::GeocodeClient;

use super::error::GeocodeError;
use super::types::{NominatimPlace, ReverseResponse};

/// Default base URL for the public Nominatim instance.
const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Nominatim's usage policy allows at most one request per second;
/// half a second is tolerated for interactive use.
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(500);

/// Configuration for the Nominatim client.
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    /// Base URL for the API
    pub base_url: String,
    /// Identifying User-Agent, required by the usage policy
    pub user_agent: String,
    /// Appended to free-text queries to bias results toward one area
    pub search_area: Option<String>,
    /// Minimum spacing between consecutive requests
    pub min_interval: Duration,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl NominatimConfig {
    /// Create a new config with the given User-Agent.
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: user_agent.into(),
            search_area: None,
            min_interval: DEFAULT_MIN_INTERVAL,
            timeout_secs: 10,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Restrict free-text search to an area, e.g. `"Maricá, Rio de Janeiro, Brazil"`.
    pub fn with_search_area(mut self, area: impl Into<String>) -> Self {
        let area = area.into();
        self.search_area = (!area.trim().is_empty()).then_some(area);
        self
    }

    pub fn with_min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Client for Nominatim forward and reverse geocoding.
#[derive(Debug)]
pub struct NominatimClient {
    http: reqwest::Client,
    base_url: String,
    search_area: Option<String>,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl NominatimClient {
    pub fn new(config: NominatimConfig) -> Result<Self, GeocodeError> {
        let mut headers = HeaderMap::new();
        let agent = HeaderValue::from_str(&config.user_agent).map_err(|_| GeocodeError::Api {
            status: 0,
            message: "Invalid user agent".to_string(),
        })?;
        headers.insert(USER_AGENT, agent);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url,
            search_area: config.search_area,
            min_interval: config.min_interval,
            last_request: Mutex::new(None),
        })
    }

    /// Free-text query as sent, with the search area appended.
    fn scoped_query(&self, query: &str) -> String {
        match &self.search_area {
            Some(area) => format!("{query}, {area}"),
            None => query.to_string(),
        }
    }

    /// Wait until `min_interval` has passed since the previous request.
    ///
    /// The lock is held while sleeping so concurrent callers queue up.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, GeocodeError> {
        self.throttle().await;

        let url = format!("{}/{}", self.base_url, path);
        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("format", "jsonv2")])
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| GeocodeError::Json {
            message: e.to_string(),
        })
    }

    /// Forward search; returns the best match.
    pub async fn search(&self, query: &str) -> Result<Place, GeocodeError> {
        let scoped = self.scoped_query(query);
        debug!(query = %scoped, "geocoding search");

        let places: Vec<NominatimPlace> = self
            .get_json("search", &[("q", scoped), ("limit", "1".to_string())])
            .await?;

        places
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NotFound(query.to_string()))?
            .into_place()
    }

    /// Reverse lookup of the address at `coordinates`.
    pub async fn reverse(&self, coordinates: Coordinates) -> Result<Place, GeocodeError> {
        debug!(%coordinates, "reverse geocoding");

        let response: ReverseResponse = self
            .get_json(
                "reverse",
                &[
                    ("lat", coordinates.latitude.to_string()),
                    ("lon", coordinates.longitude.to_string()),
                ],
            )
            .await?;

        match response {
            ReverseResponse::Found(place) => place.into_place(),
            ReverseResponse::Error { .. } => Err(GeocodeError::NotFound(coordinates.to_query())),
        }
    }
}

impl GeocodeClient for NominatimClient {
    async fn resolve(&self, query: &str) -> Result<Place, GeocodeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GeocodeError::NotFound(String::new()));
        }
        match Coordinates::parse(query) {
            Ok(coordinates) => self.reverse(coordinates).await,
            Err(_) => self.search(query).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = NominatimConfig::new("test-agent");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.search_area, None);
        assert_eq!(config.min_interval, DEFAULT_MIN_INTERVAL);
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn config_builder() {
        let config = NominatimConfig::new("test-agent")
            .with_base_url("http://localhost:8080/")
            .with_search_area("Maricá, Rio de Janeiro, Brazil")
            .with_min_interval(Duration::ZERO)
            .with_timeout(3);
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(
            config.search_area.as_deref(),
            Some("Maricá, Rio de Janeiro, Brazil")
        );
        assert_eq!(config.min_interval, Duration::ZERO);
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn blank_search_area_is_ignored() {
        let config = NominatimConfig::new("test-agent").with_search_area("  ");
        assert_eq!(config.search_area, None);
    }

    #[test]
    fn queries_are_scoped() {
        let config = NominatimConfig::new("test-agent").with_search_area("Maricá, RJ");
        let client = NominatimClient::new(config).unwrap();
        assert_eq!(client.scoped_query("Praia de Itaipuaçu"), "Praia de Itaipuaçu, Maricá, RJ");

        let client = NominatimClient::new(NominatimConfig::new("test-agent")).unwrap();
        assert_eq!(client.scoped_query("Centro"), "Centro");
    }

    #[tokio::test]
    async fn empty_query_is_not_found() {
        let client = NominatimClient::new(NominatimConfig::new("test-agent")).unwrap();
        assert!(matches!(
            client.resolve("   ").await,
            Err(GeocodeError::NotFound(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_spaces_requests() {
        let client = NominatimClient::new(
            NominatimConfig::new("test-agent").with_min_interval(Duration::from_millis(500)),
        )
        .unwrap();

        let start = Instant::now();
        client.throttle().await;
        client.throttle().await;
        client.throttle().await;
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }
}
