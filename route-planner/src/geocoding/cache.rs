//! Caching layer for geocoding lookups.
//!
//! Reverse lookups repeat whenever a user clicks near a previous point,
//! and public geocoders throttle aggressively. Successful answers are
//! cached by normalised query; failures are never cached.

use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::trace;

use crate::domain::Place;
use crate::session::GeocodeClient;

use super::error::GeocodeError;

/// Configuration for the geocode cache.
#[derive(Debug, Clone)]
pub struct GeocodeCacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for GeocodeCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60),
            max_capacity: 1000,
        }
    }
}

/// Geocoder with caching.
///
/// Wraps any `GeocodeClient` and caches successful lookups.
pub struct CachedGeocoder<G> {
    inner: G,
    cache: MokaCache<String, Place>,
}

impl<G> CachedGeocoder<G> {
    pub fn new(inner: G, config: &GeocodeCacheConfig) -> Self {
        let cache = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { inner, cache }
    }

    /// Access the underlying client for lookups that bypass the cache.
    pub fn client(&self) -> &G {
        &self.inner
    }

    /// Get cache statistics.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }
}

/// Case and whitespace differences map to the same entry.
fn cache_key(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

impl<G: GeocodeClient> GeocodeClient for CachedGeocoder<G> {
    async fn resolve(&self, query: &str) -> Result<Place, GeocodeError> {
        let key = cache_key(query);

        if let Some(place) = self.cache.get(&key).await {
            trace!(query = %key, "geocode cache hit");
            return Ok(place);
        }

        let place = self.inner.resolve(query).await?;
        self.cache.insert(key, place.clone()).await;
        Ok(place)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coordinates;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Resolves everything except "nowhere", counting calls.
    #[derive(Default)]
    struct CountingGeocoder {
        calls: AtomicUsize,
    }

    impl GeocodeClient for CountingGeocoder {
        async fn resolve(&self, query: &str) -> Result<Place, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if query.contains("nowhere") {
                return Err(GeocodeError::NotFound(query.to_string()));
            }
            Ok(Place {
                coordinates: Coordinates::new(-22.9186, -42.8197).unwrap(),
                display_name: format!("Resolved {query}"),
            })
        }
    }

    #[test]
    fn key_normalisation() {
        assert_eq!(cache_key("  Praia   de Itaipuaçu "), "praia de itaipuaçu");
        assert_eq!(cache_key("CENTRO"), cache_key("centro"));
    }

    #[test]
    fn default_config() {
        let config = GeocodeCacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(3600));
        assert_eq!(config.max_capacity, 1000);
    }

    #[tokio::test]
    async fn repeated_lookups_hit_cache() {
        let cached = CachedGeocoder::new(CountingGeocoder::default(), &GeocodeCacheConfig::default());

        let first = cached.resolve("Centro").await.unwrap();
        let second = cached.resolve(" centro ").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(cached.client().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let cached = CachedGeocoder::new(CountingGeocoder::default(), &GeocodeCacheConfig::default());

        assert!(cached.resolve("nowhere").await.is_err());
        assert!(cached.resolve("nowhere").await.is_err());
        assert_eq!(cached.client().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let cached = CachedGeocoder::new(CountingGeocoder::default(), &GeocodeCacheConfig::default());

        cached.resolve("Centro").await.unwrap();
        cached.invalidate_cache();
        cached.resolve("Centro").await.unwrap();
        assert_eq!(cached.client().calls.load(Ordering::SeqCst), 2);
    }
}
