//! Geographic points chosen by the user.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing or validating coordinates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid coordinates: {reason}")]
pub struct InvalidCoordinates {
    reason: &'static str,
}

/// A WGS84 latitude/longitude pair.
///
/// # Examples
///
/// ```
/// use route_planner::domain::Coordinates;
///
/// let c = Coordinates::parse("-22.9186, -42.8197").unwrap();
/// assert_eq!(c.latitude, -22.9186);
/// assert_eq!(c.to_string(), "-22.91860, -42.81970");
///
/// assert!(Coordinates::parse("Praia de Itaipuaçu").is_err());
/// assert!(Coordinates::parse("91.0, 10.0").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Create coordinates, rejecting non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinates> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(InvalidCoordinates {
                reason: "must be finite numbers",
            });
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(InvalidCoordinates {
                reason: "latitude must be within -90..=90",
            });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidCoordinates {
                reason: "longitude must be within -180..=180",
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Parse a `"lat, lng"` string.
    ///
    /// Exactly two comma-separated numbers are accepted; surrounding
    /// whitespace is ignored.
    pub fn parse(s: &str) -> Result<Self, InvalidCoordinates> {
        let mut parts = s.split(',');
        let (Some(lat), Some(lng), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(InvalidCoordinates {
                reason: "expected \"lat, lng\"",
            });
        };

        let parse = |part: &str| {
            part.trim().parse::<f64>().map_err(|_| InvalidCoordinates {
                reason: "not a number",
            })
        };

        Self::new(parse(lat)?, parse(lng)?)
    }

    /// The `"lat, lng"` query string sent to geocoders for reverse lookup.
    pub fn to_query(&self) -> String {
        format!("{}, {}", self.latitude, self.longitude)
    }
}

/// Five decimal places, the fallback label for unnamed points.
impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

/// Session-unique identity of a selected point.
///
/// Two points at the same coordinates are still distinct points; name
/// back-fills are matched by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PointId(pub u64);

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A point selected as origin, destination or stop.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    id: PointId,
    coordinates: Coordinates,
    display_name: Option<String>,
}

impl Point {
    pub(crate) fn new(id: PointId, coordinates: Coordinates, display_name: Option<String>) -> Self {
        Self {
            id,
            coordinates,
            display_name: display_name.filter(|n| !n.trim().is_empty()),
        }
    }

    pub fn id(&self) -> PointId {
        self.id
    }

    pub fn coordinates(&self) -> Coordinates {
        self.coordinates
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Display name if known, otherwise formatted coordinates.
    pub fn label(&self) -> String {
        match &self.display_name {
            Some(name) => name.clone(),
            None => self.coordinates.to_string(),
        }
    }

    /// Fill in a missing display name. Existing names are never replaced.
    pub(crate) fn back_fill_name(&mut self, name: String) -> bool {
        if self.display_name.is_some() || name.trim().is_empty() {
            return false;
        }
        self.display_name = Some(name);
        true
    }
}

/// A place resolved by a geocoder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub coordinates: Coordinates,
    pub display_name: String,
}
