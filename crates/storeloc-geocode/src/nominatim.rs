//! HTTP client for the Nominatim (OpenStreetMap) address search API.
//!
//! `GET {base}?q={address}&format=json&limit=1` answers with an array of
//! matches whose `lat`/`lon` are strings. An empty array means the address
//! is unknown. The public instance allows one request per second; pacing is
//! left to the caller.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::Deserialize;
use storeloc_core::ZipCoordinate;

use crate::error::GeocodeError;

pub const NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org/search";

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

/// Coordinates of the best match for an address, rounded to 4 decimal
/// places (about 11 m).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AddressMatch {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: Url,
}

impl NominatimClient {
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`GeocodeError::InvalidBaseUrl`] if
    /// `base_url` is not an absolute http(s) URL.
    pub fn with_base_url(timeout_secs: u64, base_url: &str) -> Result<Self, GeocodeError> {
        // Nominatim's usage policy rejects requests without a User-Agent.
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("storeloc/0.1 (store import geocoding)")
            .build()?;

        let parsed =
            Url::parse(base_url).map_err(|_| GeocodeError::InvalidBaseUrl(base_url.into()))?;
        if parsed.cannot_be_a_base() {
            return Err(GeocodeError::InvalidBaseUrl(base_url.into()));
        }

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    fn search_url(&self, address: &str) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("q", address)
            .append_pair("format", "json")
            .append_pair("limit", "1");
        url
    }

    /// Look up `address`. `Ok(None)` means the service has no match.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] on transport failure, a non-success status,
    /// an unparseable body, or a match whose coordinates are not usable.
    pub async fn search(&self, address: &str) -> Result<Option<AddressMatch>, GeocodeError> {
        let url = self.search_url(address);
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status {
                query: address.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let hits: Vec<SearchHit> =
            serde_json::from_str(&body).map_err(|e| GeocodeError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;

        hits.into_iter()
            .next()
            .map(|hit| hit_to_match(address, &hit))
            .transpose()
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn hit_to_match(address: &str, hit: &SearchHit) -> Result<AddressMatch, GeocodeError> {
    let invalid = |reason: String| GeocodeError::InvalidCoordinate {
        query: address.to_string(),
        reason,
    };

    let lat: f64 = hit
        .lat
        .trim()
        .parse()
        .map_err(|_| invalid(format!("latitude '{}' is not a number", hit.lat)))?;
    let lon: f64 = hit
        .lon
        .trim()
        .parse()
        .map_err(|_| invalid(format!("longitude '{}' is not a number", hit.lon)))?;

    let point = ZipCoordinate {
        lat: round4(lat),
        lon: round4(lon),
        city: None,
        state: None,
    };
    point.validate().map_err(|e| invalid(e.to_string()))?;
    Ok(AddressMatch {
        lat: point.lat,
        lon: point.lon,
    })
}
