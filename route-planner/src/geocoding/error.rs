//! Geocoding error types.

/// Errors that can occur when resolving a place.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Nothing matched the query
    #[error("no place found for {0:?}")]
    NotFound(String),

    /// API returned an error status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response JSON
    #[error("JSON parse error: {message}")]
    Json { message: String },

    #[error("rate limited by geocoding service")]
    RateLimited,
}
