//! Session configuration.

use crate::domain::TransportMode;
use crate::selection::DEFAULT_MAX_STOPS;

/// Configuration parameters for a planning session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Mode active when the session starts.
    pub default_mode: TransportMode,

    /// Maximum number of intermediate stops.
    pub max_stops: usize,
}

impl SessionConfig {
    pub fn new(default_mode: TransportMode, max_stops: usize) -> Self {
        Self {
            default_mode,
            max_stops,
        }
    }

    pub fn with_default_mode(mut self, mode: TransportMode) -> Self {
        self.default_mode = mode;
        self
    }

    pub fn with_max_stops(mut self, n: usize) -> Self {
        self.max_stops = n;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_mode: TransportMode::Driving,
            max_stops: DEFAULT_MAX_STOPS,
        }
    }
}
