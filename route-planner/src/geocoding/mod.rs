//! Geocoding: free text and coordinates to named places.
//!
//! Backed by Nominatim. Queries of the form `"lat, lng"` are answered by
//! reverse lookup, anything else by forward search scoped to the
//! configured area. A small table of preset reference points can be
//! layered in front with [`PresetGeocoder`].

mod cache;
mod client;
mod error;
mod presets;
mod types;

pub use cache::{CachedGeocoder, GeocodeCacheConfig};
pub use client::{NominatimClient, NominatimConfig};
pub use error::GeocodeError;
pub use presets::{
    PresetGeocoder, PresetKind, PresetPlace, PresetPlaces, PresetPlacesBuilder, marica_presets,
};
pub use types::{NominatimPlace, ReverseResponse};
