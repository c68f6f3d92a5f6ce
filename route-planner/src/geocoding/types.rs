//! Nominatim response types.

use serde::Deserialize;

use crate::domain::{Coordinates, Place};

use super::error::GeocodeError;

/// One `/search` result, or a successful `/reverse` answer.
///
/// Nominatim encodes coordinates as strings.
#[derive(Debug, Clone, Deserialize)]
pub struct NominatimPlace {
    pub lat: String,
    pub lon: String,
    pub display_name: String,
}

/// `/reverse` answers with either a place or `{"error": "..."}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ReverseResponse {
    Found(NominatimPlace),
    Error { error: String },
}

impl NominatimPlace {
    pub fn into_place(self) -> Result<Place, GeocodeError> {
        let parse = |s: &str| {
            s.trim().parse::<f64>().map_err(|e| GeocodeError::Json {
                message: format!("invalid coordinate {s:?}: {e}"),
            })
        };
        let coordinates = Coordinates::new(parse(&self.lat)?, parse(&self.lon)?).map_err(|e| {
            GeocodeError::Json {
                message: e.to_string(),
            }
        })?;

        Ok(Place {
            coordinates,
            display_name: self.display_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_search_results() {
        let json = r#"[{
            "place_id": 123,
            "lat": "-22.9186",
            "lon": "-42.8197",
            "display_name": "Centro, Maricá, Rio de Janeiro, Brasil",
            "type": "suburb"
        }]"#;
        let places: Vec<NominatimPlace> = serde_json::from_str(json).unwrap();
        let place = places.into_iter().next().unwrap().into_place().unwrap();
        assert_eq!(place.coordinates, Coordinates::new(-22.9186, -42.8197).unwrap());
        assert_eq!(place.display_name, "Centro, Maricá, Rio de Janeiro, Brasil");
    }

    #[test]
    fn parse_reverse_error() {
        let json = r#"{"error": "Unable to geocode"}"#;
        let response: ReverseResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(response, ReverseResponse::Error { error } if error == "Unable to geocode"));
    }

    #[test]
    fn parse_reverse_found() {
        let json = r#"{"lat": "-22.92", "lon": "-42.818", "display_name": "Rua X, Maricá"}"#;
        let response: ReverseResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(response, ReverseResponse::Found(_)));
    }

    #[test]
    fn bad_coordinates_rejected() {
        let place = NominatimPlace {
            lat: "north".into(),
            lon: "0".into(),
            display_name: "Nowhere".into(),
        };
        assert!(matches!(place.into_place(), Err(GeocodeError::Json { .. })));
    }
}
