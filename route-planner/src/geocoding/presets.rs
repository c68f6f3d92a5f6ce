//! Named reference points that resolve without a geocoder call.
//!
//! A preset is selected like any other place: its name goes through
//! [`GeocodeClient::resolve`], and [`PresetGeocoder`] answers it from the
//! table before the wrapped client is asked.

use std::collections::HashMap;

use serde::Serialize;
use tracing::trace;

use crate::domain::{Coordinates, Place};
use crate::session::GeocodeClient;

use super::error::GeocodeError;

/// What sort of place a preset is, for choosing an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetKind {
    Beach,
    Lagoon,
    Centre,
    Landmark,
}

/// A named reference point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresetPlace {
    pub name: String,
    pub coordinates: Coordinates,
    pub kind: PresetKind,
    pub description: String,
}

impl PresetPlace {
    pub fn to_place(&self) -> Place {
        Place {
            coordinates: self.coordinates,
            display_name: self.name.clone(),
        }
    }
}

/// A lookup table of presets, keyed by normalised name.
#[derive(Debug, Clone, Default)]
pub struct PresetPlaces {
    places: Vec<PresetPlace>,
    by_name: HashMap<String, usize>,
}

impl PresetPlaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a preset. A later preset with the same name replaces the earlier
    /// one.
    pub fn add(&mut self, place: PresetPlace) {
        let key = name_key(&place.name);
        match self.by_name.get(&key) {
            Some(&i) => self.places[i] = place,
            None => {
                self.by_name.insert(key, self.places.len());
                self.places.push(place);
            }
        }
    }

    /// Look a preset up by name, ignoring case and extra whitespace.
    pub fn get(&self, name: &str) -> Option<&PresetPlace> {
        self.by_name.get(&name_key(name)).map(|&i| &self.places[i])
    }

    /// Every preset, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PresetPlace> {
        self.places.iter()
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

/// Builder for a preset table.
#[derive(Debug, Default)]
pub struct PresetPlacesBuilder {
    inner: PresetPlaces,
}

impl PresetPlacesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a preset. Entries with invalid coordinates are skipped.
    pub fn add(mut self, name: &str, lat: f64, lng: f64, kind: PresetKind, description: &str) -> Self {
        if let Ok(coordinates) = Coordinates::new(lat, lng) {
            self.inner.add(PresetPlace {
                name: name.to_string(),
                coordinates,
                kind,
                description: description.to_string(),
            });
        }
        self
    }

    pub fn build(self) -> PresetPlaces {
        self.inner
    }
}

/// Reference points around Maricá.
pub fn marica_presets() -> PresetPlaces {
    PresetPlacesBuilder::new()
        .add(
            "Praia de Maricá",
            -22.9189,
            -42.8194,
            PresetKind::Beach,
            "Principal praia da cidade",
        )
        .add(
            "Lagoa de Maricá",
            -22.9200,
            -42.8300,
            PresetKind::Lagoon,
            "Lagoa costeira com águas calmas",
        )
        .add(
            "Centro de Maricá",
            -22.9180,
            -42.8190,
            PresetKind::Centre,
            "Centro comercial da cidade",
        )
        .add(
            "Barra de Maricá",
            -22.9300,
            -42.8100,
            PresetKind::Beach,
            "Extremidade da praia",
        )
        .build()
}

fn name_key(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Geocoder that answers preset names itself and delegates everything
/// else.
pub struct PresetGeocoder<G> {
    inner: G,
    presets: PresetPlaces,
}

impl<G> PresetGeocoder<G> {
    pub fn new(inner: G, presets: PresetPlaces) -> Self {
        Self { inner, presets }
    }

    pub fn presets(&self) -> &PresetPlaces {
        &self.presets
    }

    pub fn client(&self) -> &G {
        &self.inner
    }
}

impl<G: GeocodeClient> GeocodeClient for PresetGeocoder<G> {
    async fn resolve(&self, query: &str) -> Result<Place, GeocodeError> {
        if let Some(preset) = self.presets.get(query) {
            trace!(name = %preset.name, "preset place");
            return Ok(preset.to_place());
        }
        self.inner.resolve(query).await
    }
}
