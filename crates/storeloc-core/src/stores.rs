//! Record types shared by the repository, the resolver and the HTTP layer.
//!
//! Every type that is persisted in the key-value store has a `validate`
//! method; the storage boundary decodes with serde and then validates, so a
//! record that parses but carries nonsense (empty name, NaN latitude) is
//! rejected rather than trusted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("field '{0}' must not be empty")]
    EmptyField(&'static str),
    #[error("field '{0}' must be a finite number")]
    NonFinite(&'static str),
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(String),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(String),
}

/// A retail location as stored under `store:{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub store_name: String,
    pub address: String,
    pub lat: f64,
    pub lon: f64,
    pub retailer: String,
}

impl Store {
    /// Dedup key: trimmed, lower-cased address.
    #[must_use]
    pub fn normalized_address(&self) -> String {
        normalize_address(&self.address)
    }

    /// # Errors
    ///
    /// Returns the first [`RecordError`] found, checking the text fields
    /// before the coordinates.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.store_name.trim().is_empty() {
            return Err(RecordError::EmptyField("store_name"));
        }
        if self.address.trim().is_empty() {
            return Err(RecordError::EmptyField("address"));
        }
        if self.retailer.trim().is_empty() {
            return Err(RecordError::EmptyField("retailer"));
        }
        validate_coordinate(self.lat, self.lon)
    }
}

#[must_use]
pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

/// A store together with its positional id, as returned by list operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedStore {
    #[serde(flatten)]
    pub store: Store,
    pub id: u64,
}

/// A store annotated with its distance from a search centre. Only meaningful
/// inside a single search response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreWithDistance {
    #[serde(flatten)]
    pub store: Store,
    pub distance_miles: f64,
}

/// Resolved location of a postal code, stored under `zip:{zip}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZipCoordinate {
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl ZipCoordinate {
    /// # Errors
    ///
    /// Returns [`RecordError`] if the coordinate is not a finite, in-range
    /// latitude/longitude pair.
    pub fn validate(&self) -> Result<(), RecordError> {
        validate_coordinate(self.lat, self.lon)
    }
}

/// The id counter stored under `store:count`: the next id to assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreCount {
    pub count: u64,
}

fn validate_coordinate(lat: f64, lon: f64) -> Result<(), RecordError> {
    if !lat.is_finite() {
        return Err(RecordError::NonFinite("lat"));
    }
    if !lon.is_finite() {
        return Err(RecordError::NonFinite("lon"));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(RecordError::LatitudeOutOfRange(lat.to_string()));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(RecordError::LongitudeOutOfRange(lon.to_string()));
    }
    Ok(())
}
