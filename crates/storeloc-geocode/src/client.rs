//! HTTP client for the Zippopotam.us postal code API.
//!
//! `GET {base}/{zip}` answers with
//! `{"places": [{"latitude": "34.0901", "longitude": "-118.4065", ...}]}`.
//! Coordinates arrive as strings and are parsed here; unknown ZIPs are a 404.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use storeloc_core::ZipCoordinate;

use crate::error::GeocodeError;

/// Something that can turn a ZIP code into a coordinate.
#[async_trait]
pub trait GeocodeSource: Send + Sync {
    /// # Errors
    ///
    /// Returns [`GeocodeError`] for any failure to produce a coordinate.
    async fn lookup(&self, zip: &str) -> Result<ZipCoordinate, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct PlacesResponse {
    #[serde(default)]
    places: Vec<Place>,
}

#[derive(Debug, Deserialize)]
struct Place {
    latitude: String,
    longitude: String,
    #[serde(rename = "place name")]
    place_name: Option<String>,
    #[serde(rename = "state abbreviation")]
    state_abbreviation: Option<String>,
}

/// Client for the Zippopotam.us API. The base URL comes from configuration
/// so tests can point it at a mock server.
#[derive(Debug, Clone)]
pub struct ZippopotamClient {
    client: Client,
    base_url: Url,
}

impl ZippopotamClient {
    /// Creates a client with a custom base URL.
    ///
    /// `timeout_secs` bounds the whole request; a timeout surfaces as
    /// [`GeocodeError::Http`].
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`GeocodeError::InvalidBaseUrl`] if
    /// `base_url` is not an absolute http(s) URL.
    pub fn with_base_url(timeout_secs: u64, base_url: &str) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("storeloc/0.1")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed =
            Url::parse(&normalised).map_err(|_| GeocodeError::InvalidBaseUrl(base_url.into()))?;
        if parsed.cannot_be_a_base() {
            return Err(GeocodeError::InvalidBaseUrl(base_url.into()));
        }

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    /// The lookup URL for `zip`, with the ZIP percent-encoded as a single
    /// path segment.
    fn zip_url(&self, zip: &str) -> Result<Url, GeocodeError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| GeocodeError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push(zip);
        Ok(url)
    }
}

#[async_trait]
impl GeocodeSource for ZippopotamClient {
    async fn lookup(&self, zip: &str) -> Result<ZipCoordinate, GeocodeError> {
        let url = self.zip_url(zip)?;
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status {
                query: zip.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let payload: PlacesResponse =
            serde_json::from_str(&body).map_err(|e| GeocodeError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;

        let place = payload
            .places
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NoPlaces(zip.to_string()))?;

        place_to_coordinate(zip, place)
    }
}

fn place_to_coordinate(zip: &str, place: Place) -> Result<ZipCoordinate, GeocodeError> {
    let invalid = |reason: String| GeocodeError::InvalidCoordinate {
        query: zip.to_string(),
        reason,
    };

    let lat: f64 = place
        .latitude
        .trim()
        .parse()
        .map_err(|_| invalid(format!("latitude '{}' is not a number", place.latitude)))?;
    let lon: f64 = place
        .longitude
        .trim()
        .parse()
        .map_err(|_| invalid(format!("longitude '{}' is not a number", place.longitude)))?;

    let coordinate = ZipCoordinate {
        lat,
        lon,
        city: place.place_name,
        state: place.state_abbreviation,
    };
    coordinate.validate().map_err(|e| invalid(e.to_string()))?;
    Ok(coordinate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> ZippopotamClient {
        ZippopotamClient::with_base_url(5, base_url).expect("client construction should not fail")
    }

    fn place(latitude: &str, longitude: &str) -> Place {
        Place {
            latitude: latitude.to_string(),
            longitude: longitude.to_string(),
            place_name: Some("Beverly Hills".to_string()),
            state_abbreviation: Some("CA".to_string()),
        }
    }

    #[test]
    fn zip_url_appends_zip_as_path_segment() {
        let client = test_client("https://api.zippopotam.us/us");
        assert_eq!(
            client.zip_url("90210").unwrap().as_str(),
            "https://api.zippopotam.us/us/90210"
        );
    }

    #[test]
    fn zip_url_tolerates_trailing_slash_and_encodes_input() {
        let client = test_client("https://api.zippopotam.us/us/");
        assert_eq!(
            client.zip_url("90210").unwrap().as_str(),
            "https://api.zippopotam.us/us/90210"
        );
        assert_eq!(
            client.zip_url("a/b").unwrap().as_str(),
            "https://api.zippopotam.us/us/a%2Fb"
        );
    }

    #[test]
    fn with_base_url_rejects_garbage() {
        assert!(matches!(
            ZippopotamClient::with_base_url(5, "not a url"),
            Err(GeocodeError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn place_to_coordinate_parses_string_coordinates() {
        let coordinate = place_to_coordinate("90210", place("34.0901", " -118.4065")).unwrap();
        assert!((coordinate.lat - 34.0901).abs() < f64::EPSILON);
        assert!((coordinate.lon + 118.4065).abs() < f64::EPSILON);
        assert_eq!(coordinate.city.as_deref(), Some("Beverly Hills"));
        assert_eq!(coordinate.state.as_deref(), Some("CA"));
    }

    #[test]
    fn place_to_coordinate_rejects_unparseable_latitude() {
        let err = place_to_coordinate("90210", place("north", "-118.4")).unwrap_err();
        assert!(matches!(err, GeocodeError::InvalidCoordinate { .. }));
    }

    #[test]
    fn place_to_coordinate_rejects_out_of_range_longitude() {
        let err = place_to_coordinate("90210", place("34.0", "-218.4")).unwrap_err();
        assert!(err.to_string().contains("longitude"));
    }
}
