//! Transport modes.

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Error returned when parsing an unknown transport mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transport mode: {0:?} (expected driving, walking or cycling)")]
pub struct UnknownMode(String);

/// A transport profile supported by the routing service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Driving,
    Walking,
    Cycling,
}

impl TransportMode {
    /// Every mode, in comparison display order.
    pub const ALL: [TransportMode; 3] = [
        TransportMode::Driving,
        TransportMode::Walking,
        TransportMode::Cycling,
    ];

    /// Profile name used in routing requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Driving => "driving",
            TransportMode::Walking => "walking",
            TransportMode::Cycling => "cycling",
        }
    }

    /// Average urban speed used for travel-time estimates.
    pub fn average_speed_kmh(&self) -> f64 {
        match self {
            TransportMode::Driving => 30.0,
            TransportMode::Walking => 5.0,
            TransportMode::Cycling => 15.0,
        }
    }

    /// Estimate travel time over `distance_meters`, rounded to whole minutes.
    pub fn estimated_travel_time(&self, distance_meters: f64) -> Duration {
        let hours = (distance_meters.max(0.0) / 1000.0) / self.average_speed_kmh();
        Duration::minutes((hours * 60.0).round() as i64)
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "driving" | "car" => Ok(TransportMode::Driving),
            "walking" | "foot" => Ok(TransportMode::Walking),
            "cycling" | "bike" => Ok(TransportMode::Cycling),
            _ => Err(UnknownMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_profiles_and_aliases() {
        assert_eq!("driving".parse(), Ok(TransportMode::Driving));
        assert_eq!("Walking".parse(), Ok(TransportMode::Walking));
        assert_eq!("bike".parse(), Ok(TransportMode::Cycling));
        assert!("teleport".parse::<TransportMode>().is_err());
    }

    #[test]
    fn display_matches_profile() {
        for mode in TransportMode::ALL {
            assert_eq!(mode.to_string(), mode.as_str());
            assert_eq!(mode.as_str().parse(), Ok(mode));
        }
    }

    #[test]
    fn travel_time_estimates() {
        // 15 km by car at 30 km/h
        assert_eq!(
            TransportMode::Driving.estimated_travel_time(15_000.0),
            Duration::minutes(30)
        );
        // 1 km on foot at 5 km/h
        assert_eq!(
            TransportMode::Walking.estimated_travel_time(1_000.0),
            Duration::minutes(12)
        );
        // 2.5 km by bike at 15 km/h
        assert_eq!(
            TransportMode::Cycling.estimated_travel_time(2_500.0),
            Duration::minutes(10)
        );
        assert_eq!(
            TransportMode::Driving.estimated_travel_time(-5.0),
            Duration::zero()
        );
    }

    #[test]
    fn serde_uses_lowercase() {
        let json = serde_json::to_string(&TransportMode::Cycling).unwrap();
        assert_eq!(json, "\"cycling\"");
        let mode: TransportMode = serde_json::from_str("\"walking\"").unwrap();
        assert_eq!(mode, TransportMode::Walking);
    }
}
