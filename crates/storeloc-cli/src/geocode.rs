//! Fill in store coordinates from their addresses before an import.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use storeloc_geocode::NominatimClient;
use tokio::time::{interval, MissedTickBehavior};

use crate::stores::parse_store_file;

/// A store whose coordinates may not be known yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct DraftStore {
    pub store_name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    pub retailer: String,
}

impl DraftStore {
    fn needs_coordinates(&self) -> bool {
        self.lat.is_none() || self.lon.is_none()
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct GeocodeSummary {
    pub updated: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Look up coordinates for `drafts` in place, one request per `pace`.
///
/// Only stores missing a coordinate are looked up unless `all` is set. A
/// failed lookup leaves the store unchanged.
pub(crate) async fn fill_coordinates(
    client: &NominatimClient,
    drafts: &mut [DraftStore],
    all: bool,
    pace: Duration,
) -> GeocodeSummary {
    let mut summary = GeocodeSummary::default();
    let mut ticker = interval(pace);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    for draft in drafts.iter_mut() {
        if !all && !draft.needs_coordinates() {
            summary.skipped += 1;
            continue;
        }

        ticker.tick().await;
        match client.search(&draft.address).await {
            Ok(Some(found)) => {
                tracing::info!(
                    address = %draft.address,
                    lat = found.lat,
                    lon = found.lon,
                    "geocoded"
                );
                draft.lat = Some(found.lat);
                draft.lon = Some(found.lon);
                summary.updated += 1;
            }
            Ok(None) => {
                tracing::warn!(
                    address = %draft.address,
                    "no match; keeping existing coordinates"
                );
                summary.failed += 1;
            }
            Err(e) => {
                tracing::warn!(address = %draft.address, error = %e, "geocoding failed");
                summary.failed += 1;
            }
        }
    }
    summary
}

/// Geocode the stores in `file` and write the result to `output`, or back
/// to `file` when no output is given.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or written. Lookup
/// failures are counted, not returned.
pub(crate) async fn run_geocode(
    client: &NominatimClient,
    file: &Path,
    output: Option<&Path>,
    all: bool,
    pace: Duration,
) -> anyhow::Result<GeocodeSummary> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let mut drafts: Vec<DraftStore> = parse_store_file(&raw).with_context(|| {
        format!(
            "invalid store file {}: each store needs store_name, address, retailer",
            file.display()
        )
    })?;

    let summary = fill_coordinates(client, &mut drafts, all, pace).await;

    let target = output.unwrap_or(file);
    let mut body = serde_json::to_string_pretty(&drafts)?;
    body.push('\n');
    tokio::fs::write(target, body)
        .await
        .with_context(|| format!("failed to write {}", target.display()))?;

    println!(
        "geocoded {} stores, {} failed, {} already had coordinates; saved to {}",
        summary.updated,
        summary.failed,
        summary.skipped,
        target.display()
    );
    if summary.failed > 0 {
        println!("stores that failed still lack coordinates and will be rejected by `import`");
    }
    Ok(summary)
}
