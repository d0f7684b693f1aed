use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use storeloc_core::Store;
use storeloc_db::StoreRepository;

/// Accepted shapes for a store file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoreFile<T> {
    Bare(Vec<T>),
    Wrapped { stores: Vec<T> },
}

/// Parse a JSON array of records, or an object with a `stores` array.
pub(crate) fn parse_store_file<T: DeserializeOwned>(raw: &str) -> serde_json::Result<Vec<T>> {
    Ok(match serde_json::from_str::<StoreFile<T>>(raw)? {
        StoreFile::Bare(items) | StoreFile::Wrapped { stores: items } => items,
    })
}

/// Parse an import file body into stores.
///
/// # Errors
///
/// Returns an error if the JSON is neither a store array nor an object with a
/// `stores` array, or if any element lacks one of the five store fields.
pub(crate) fn parse_import(raw: &str) -> anyhow::Result<Vec<Store>> {
    parse_store_file(raw).context(
        "expected a JSON array of stores or {\"stores\": [...]}, each with \
         store_name, address, lat, lon, retailer",
    )
}

pub(crate) async fn run_init(repo: &StoreRepository) -> anyhow::Result<()> {
    let count = repo.seed_sample_stores().await?;
    println!("initialized {count} sample stores");
    Ok(())
}

/// Bulk-create the stores in `file`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, is empty, or any
/// store fails validation. Nothing is written in those cases.
pub(crate) async fn run_import(repo: &StoreRepository, file: &Path) -> anyhow::Result<()> {
    let raw = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let stores =
        parse_import(&raw).with_context(|| format!("invalid import file {}", file.display()))?;

    let created = repo.bulk_create(stores).await?;
    if let (Some(first), Some(last)) = (created.first(), created.last()) {
        println!(
            "imported {} stores (ids {}..={})",
            created.len(),
            first.id,
            last.id
        );
    }
    Ok(())
}

pub(crate) async fn run_list(repo: &StoreRepository) -> anyhow::Result<()> {
    let Some(stores) = repo.load_all().await? else {
        println!("store database not initialized; run `init` or `import` first");
        return Ok(());
    };

    println!("{:<6}{:<14}{:<30}ADDRESS", "ID", "RETAILER", "NAME");
    for s in &stores {
        println!(
            "{:<6}{:<14}{:<30}{}",
            s.id, s.store.retailer, s.store.store_name, s.store.address
        );
    }
    println!("{} stores", stores.len());
    Ok(())
}

pub(crate) async fn run_retailers(repo: &StoreRepository) -> anyhow::Result<()> {
    for retailer in repo.list_retailers().await? {
        println!("{retailer}");
    }
    Ok(())
}

pub(crate) async fn run_delete(repo: &StoreRepository, id: u64) -> anyhow::Result<()> {
    repo.delete_by_id(id).await?;
    println!("deleted store {id}");
    Ok(())
}

pub(crate) async fn run_clear(repo: &StoreRepository) -> anyhow::Result<()> {
    match repo.delete_all().await? {
        0 => println!("database is already empty"),
        n => println!("cleared {n} store ids"),
    }
    Ok(())
}

pub(crate) async fn run_dedupe(repo: &StoreRepository) -> anyhow::Result<()> {
    let removed = repo.dedupe().await?;
    if removed.is_empty() {
        println!("no duplicate addresses found");
    } else {
        let ids: Vec<String> = removed.iter().map(ToString::to_string).collect();
        println!("removed {} duplicates (ids {})", removed.len(), ids.join(", "));
    }
    Ok(())
}
