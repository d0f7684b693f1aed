use std::sync::Arc;

use storeloc_core::{AppConfig, ZipCoordinate};
use storeloc_db::KvStore;
use storeloc_geocode::{ZipResolver, ZippopotamClient};

fn resolver(config: &AppConfig, kv: Arc<dyn KvStore>) -> anyhow::Result<ZipResolver> {
    let client =
        ZippopotamClient::with_base_url(config.geocoder_timeout_secs, &config.geocoder_base_url)?;
    Ok(ZipResolver::new(Arc::new(client), kv))
}

fn describe(coordinate: &ZipCoordinate) -> String {
    let place = match (coordinate.city.as_deref(), coordinate.state.as_deref()) {
        (Some(city), Some(state)) => format!(" {city}, {state}"),
        (Some(city), None) => format!(" {city}"),
        (None, Some(state)) => format!(" {state}"),
        (None, None) => String::new(),
    };
    format!("{:.4}, {:.4}{place}", coordinate.lat, coordinate.lon)
}

/// Resolve `zip` the way a search would, persisting the result.
///
/// # Errors
///
/// Returns an error if the geocoder client cannot be built or the ZIP cannot
/// be resolved.
pub(crate) async fn run_resolve(
    config: &AppConfig,
    kv: Arc<dyn KvStore>,
    zip: &str,
) -> anyhow::Result<()> {
    let resolution = resolver(config, kv)?.resolve(zip).await;
    let origin = resolution.origin();
    match resolution.coordinate() {
        Some(coordinate) => {
            println!("{zip}: {} ({origin})", describe(coordinate));
            Ok(())
        }
        None => anyhow::bail!("ZIP code {zip} not found"),
    }
}

pub(crate) async fn run_zips(config: &AppConfig, kv: Arc<dyn KvStore>) -> anyhow::Result<()> {
    let persisted = resolver(config, kv)?.persisted().await?;
    for (zip, coordinate) in &persisted {
        println!("{zip:<8}{}", describe(coordinate));
    }
    println!("{} persisted ZIP codes", persisted.len());
    Ok(())
}
