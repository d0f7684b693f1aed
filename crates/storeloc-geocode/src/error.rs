use thiserror::Error;

/// Errors returned by a geocoding source.
///
/// None of these reach an HTTP caller: the resolver treats every variant as
/// "the external lookup failed" and moves on to the persisted fallback.
/// `query` is the ZIP or address that was looked up.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Network, TLS or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status (404 for unknown ZIPs).
    #[error("geocoder returned status {status} for '{query}'")]
    Status { query: String, status: u16 },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A well-formed response with an empty `places` array.
    #[error("no places returned for '{0}'")]
    NoPlaces(String),

    /// The first match carried a latitude/longitude that is not a usable
    /// coordinate.
    #[error("invalid coordinate for '{query}': {reason}")]
    InvalidCoordinate { query: String, reason: String },

    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),
}
