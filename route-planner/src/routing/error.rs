//! Routing client error types.

/// Errors from a routing service.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// Service returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Service answered but found no route between the waypoints
    #[error("no route found: {0}")]
    NoRoute(String),

    #[error("rate limited by routing service")]
    RateLimited,

    #[error("at least 2 waypoints are required, got {count}")]
    TooFewWaypoints { count: usize },

    #[error("too many waypoints: {count} (maximum {max})")]
    TooManyWaypoints { count: usize, max: usize },

    /// Offline fixtures could not be loaded or served
    #[error("fixture error: {message}")]
    Fixture { message: String },
}
