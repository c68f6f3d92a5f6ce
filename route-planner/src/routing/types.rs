//! OSRM `route` service response types.
//!
//! Only the fields the planner reads are modelled. OSRM coordinates are
//! `[longitude, latitude]`.

use serde::{Deserialize, Serialize};

/// Top-level `route/v1` response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OsrmResponse {
    /// `"Ok"` on success, otherwise an error code such as `"NoRoute"`.
    pub code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default)]
    pub routes: Vec<OsrmRoute>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OsrmRoute {
    /// Metres.
    pub distance: f64,

    /// Seconds.
    #[serde(default)]
    pub duration: Option<f64>,

    /// Present with `geometries=geojson`.
    #[serde(default)]
    pub geometry: Option<LineString>,

    #[serde(default)]
    pub legs: Vec<OsrmLeg>,
}

/// GeoJSON `LineString`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LineString {
    #[serde(default)]
    pub coordinates: Vec<Vec<f64>>,
}

/// The part of a route between two consecutive waypoints.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OsrmLeg {
    /// Only populated with `steps=true`.
    #[serde(default)]
    pub steps: Vec<OsrmStep>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OsrmStep {
    /// Street name; empty when unnamed.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub distance: Option<f64>,

    #[serde(default)]
    pub duration: Option<f64>,

    pub maneuver: Maneuver,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Maneuver {
    /// `depart`, `arrive`, `turn`, `roundabout`, `new name`, ...
    #[serde(rename = "type")]
    pub kind: String,

    /// `left`, `slight right`, `straight`, `uturn`, ...
    #[serde(default)]
    pub modifier: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_route_with_steps() {
        let json = r#"{
            "code": "Ok",
            "routes": [{
                "distance": 1520.3,
                "duration": 240.1,
                "weight": 240.1,
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[-42.8197, -22.9186], [-42.8180, -22.9200]]
                },
                "legs": [{
                    "summary": "",
                    "steps": [
                        {"name": "Rua Abreu Sodré", "distance": 120.0, "duration": 20.0,
                         "maneuver": {"type": "depart", "location": [-42.8197, -22.9186]}},
                        {"name": "", "distance": 0.0, "duration": 0.0,
                         "maneuver": {"type": "arrive", "modifier": "left"}}
                    ]
                }]
            }],
            "waypoints": []
        }"#;

        let response: OsrmResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.code, "Ok");
        let route = &response.routes[0];
        assert_eq!(route.distance, 1520.3);
        assert_eq!(route.geometry.as_ref().unwrap().coordinates.len(), 2);
        assert_eq!(route.legs[0].steps.len(), 2);
        assert_eq!(route.legs[0].steps[0].maneuver.kind, "depart");
        assert_eq!(
            route.legs[0].steps[1].maneuver.modifier.as_deref(),
            Some("left")
        );
    }

    #[test]
    fn parse_error_response() {
        let json = r#"{"code": "NoRoute", "message": "Impossible route between points"}"#;
        let response: OsrmResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.code, "NoRoute");
        assert!(response.routes.is_empty());
    }
}
