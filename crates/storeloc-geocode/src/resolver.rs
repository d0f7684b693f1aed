//! ZIP code to coordinate resolution.
//!
//! Order of attempts: the process-local cache, then the geocoding source,
//! then the coordinate persisted under `zip:{zip}` by an earlier successful
//! lookup. Successful lookups are written back to storage on a best-effort
//! basis so the fallback has something to serve the next time the source is
//! down.

use std::sync::Arc;

use storeloc_core::ZipCoordinate;
use storeloc_db::keys::{zip_key, ZIP_PREFIX};
use storeloc_db::records::{decode, encode};
use storeloc_db::{DbError, KvStore};

use crate::cache::CoordinateCache;
use crate::client::GeocodeSource;

/// Outcome of [`ZipResolver::resolve`], tagged with where the coordinate
/// came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Cached(ZipCoordinate),
    Fetched(ZipCoordinate),
    Fallback(ZipCoordinate),
    NotFound,
}

impl Resolution {
    #[must_use]
    pub fn coordinate(&self) -> Option<&ZipCoordinate> {
        match self {
            Self::Cached(c) | Self::Fetched(c) | Self::Fallback(c) => Some(c),
            Self::NotFound => None,
        }
    }

    #[must_use]
    pub fn into_coordinate(self) -> Option<ZipCoordinate> {
        match self {
            Self::Cached(c) | Self::Fetched(c) | Self::Fallback(c) => Some(c),
            Self::NotFound => None,
        }
    }

    /// Short label for logs and CLI output.
    #[must_use]
    pub fn origin(&self) -> &'static str {
        match self {
            Self::Cached(_) => "cache",
            Self::Fetched(_) => "api",
            Self::Fallback(_) => "fallback",
            Self::NotFound => "not_found",
        }
    }
}

pub struct ZipResolver {
    source: Arc<dyn GeocodeSource>,
    kv: Arc<dyn KvStore>,
    cache: CoordinateCache,
}

impl ZipResolver {
    #[must_use]
    pub fn new(source: Arc<dyn GeocodeSource>, kv: Arc<dyn KvStore>) -> Self {
        Self {
            source,
            kv,
            cache: CoordinateCache::new(),
        }
    }

    /// Resolve `zip` to a coordinate. Never fails: every upstream or storage
    /// problem degrades to the next step and ultimately to
    /// [`Resolution::NotFound`].
    ///
    /// The ZIP is used verbatim as the cache and storage key.
    pub async fn resolve(&self, zip: &str) -> Resolution {
        if let Some(coordinate) = self.cache.get(zip) {
            tracing::info!(zip, "zip resolved from cache");
            return Resolution::Cached(coordinate);
        }

        match self.source.lookup(zip).await {
            Ok(coordinate) => {
                self.cache.insert(zip, coordinate.clone());
                self.persist(zip, &coordinate).await;
                tracing::info!(
                    zip,
                    lat = coordinate.lat,
                    lon = coordinate.lon,
                    "zip resolved from geocoder"
                );
                return Resolution::Fetched(coordinate);
            }
            Err(e) => {
                tracing::info!(
                    zip,
                    error = %e,
                    "geocoder lookup failed, trying persisted coordinate"
                );
            }
        }

        match self.load_persisted(zip).await {
            Ok(Some(coordinate)) => {
                self.cache.insert(zip, coordinate.clone());
                tracing::info!(zip, "zip resolved from persisted fallback");
                Resolution::Fallback(coordinate)
            }
            Ok(None) => Resolution::NotFound,
            Err(e) => {
                tracing::warn!(zip, error = %e, "failed to read persisted coordinate");
                Resolution::NotFound
            }
        }
    }

    /// Every coordinate persisted by earlier lookups, ordered by ZIP.
    /// Records that fail to decode are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the storage scan fails.
    pub async fn persisted(&self) -> Result<Vec<(String, ZipCoordinate)>, DbError> {
        let entries = self.kv.scan_prefix(ZIP_PREFIX).await?;
        Ok(entries
            .into_iter()
            .filter_map(|(key, value)| match decode::<ZipCoordinate>(&key, value) {
                Ok(coordinate) => {
                    let zip = key.strip_prefix(ZIP_PREFIX).unwrap_or(key.as_str()).to_string();
                    Some((zip, coordinate))
                }
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed zip record");
                    None
                }
            })
            .collect())
    }

    /// Number of ZIPs held in the in-process cache.
    #[must_use]
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    async fn persist(&self, zip: &str, coordinate: &ZipCoordinate) {
        let result = match encode(coordinate) {
            Ok(value) => self.kv.set(&zip_key(zip), value).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!(zip, error = %e, "failed to persist zip coordinate");
        }
    }

    async fn load_persisted(&self, zip: &str) -> Result<Option<ZipCoordinate>, DbError> {
        let key = zip_key(zip);
        match self.kv.get(&key).await? {
            Some(value) => Ok(Some(decode(&key, value)?)),
            None => Ok(None),
        }
    }
}
