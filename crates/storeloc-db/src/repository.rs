//! Store CRUD over the key-value contract.
//!
//! Stores live at `store:{id}` where `id` is handed out from the counter at
//! `store:count`. Ids are dense at issue time but deletions leave holes: the
//! counter is the number of ids ever issued, not the number of stores
//! present, and it only goes back to zero on a full clear.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use storeloc_core::{seed::sample_stores, IndexedStore, Store, StoreCount};

use crate::keys::{store_key, store_keys, STORE_COUNT_KEY};
use crate::kv::KvStore;
use crate::records::{decode, encode};
use crate::DbError;

#[derive(Clone)]
pub struct StoreRepository {
    kv: Arc<dyn KvStore>,
}

impl StoreRepository {
    #[must_use]
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// The current counter, or `None` if the store list was never initialized.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] on storage failure or a malformed counter record.
    pub async fn count(&self) -> Result<Option<u64>, DbError> {
        match self.kv.get(STORE_COUNT_KEY).await? {
            Some(value) => Ok(Some(decode::<StoreCount>(STORE_COUNT_KEY, value)?.count)),
            None => Ok(None),
        }
    }

    /// Insert one store and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidStore`] before any write if the store fails
    /// validation, or [`DbError`] on storage failure.
    pub async fn create(&self, store: &Store) -> Result<u64, DbError> {
        store
            .validate()
            .map_err(|source| DbError::InvalidStore { index: 0, source })?;

        let id = self.kv.reserve(STORE_COUNT_KEY, 1).await?;
        self.kv.set(&store_key(id), encode(store)?).await?;

        tracing::info!(id, retailer = %store.retailer, "store created");
        Ok(id)
    }

    /// Insert every store with contiguous ids starting at the current counter.
    ///
    /// The whole batch is validated before anything is written; the counter is
    /// advanced once for the batch.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::EmptyBatch`] for an empty input,
    /// [`DbError::InvalidStore`] naming the first invalid element, or
    /// [`DbError`] on storage failure.
    pub async fn bulk_create(&self, stores: Vec<Store>) -> Result<Vec<IndexedStore>, DbError> {
        if stores.is_empty() {
            return Err(DbError::EmptyBatch);
        }
        for (index, store) in stores.iter().enumerate() {
            store
                .validate()
                .map_err(|source| DbError::InvalidStore { index, source })?;
        }

        let first_id = self.kv.reserve(STORE_COUNT_KEY, stores.len() as u64).await?;
        let indexed: Vec<IndexedStore> = stores
            .into_iter()
            .zip(first_id..)
            .map(|(store, id)| IndexedStore { store, id })
            .collect();

        let entries = indexed
            .iter()
            .map(|s| Ok((store_key(s.id), encode(&s.store)?)))
            .collect::<Result<Vec<_>, DbError>>()?;
        self.kv.mset(entries).await?;

        tracing::info!(count = indexed.len(), first_id, "stores bulk created");
        Ok(indexed)
    }

    /// All stores with their ids, ascending. Empty when uninitialized.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] on storage failure or a malformed counter record.
    pub async fn list_all(&self) -> Result<Vec<IndexedStore>, DbError> {
        Ok(self.load_all().await?.unwrap_or_default())
    }

    /// Like [`list_all`](Self::list_all) but distinguishes "never initialized"
    /// (`None`) from "initialized and empty".
    ///
    /// Issues exactly one batched read for the stores regardless of count.
    /// Holes are skipped; records that fail to decode are skipped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] on storage failure or a malformed counter record.
    pub async fn load_all(&self) -> Result<Option<Vec<IndexedStore>>, DbError> {
        let Some(count) = self.count().await? else {
            return Ok(None);
        };
        if count == 0 {
            return Ok(Some(Vec::new()));
        }

        let keys = store_keys(count);
        let values = self.kv.mget(&keys).await?;

        let stores = keys
            .iter()
            .zip(values)
            .zip(0u64..)
            .filter_map(|((key, value), id)| {
                let value = value?;
                match decode::<Store>(key, value) {
                    Ok(store) => Some(IndexedStore { store, id }),
                    Err(e) => {
                        tracing::warn!(error = %e, "skipping malformed store record");
                        None
                    }
                }
            })
            .collect();

        Ok(Some(stores))
    }

    /// Delete one store. The counter is left alone, so the id is never reused.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] on storage failure.
    pub async fn delete_by_id(&self, id: u64) -> Result<(), DbError> {
        self.kv.del(&store_key(id)).await?;
        tracing::info!(id, "store deleted");
        Ok(())
    }

    /// Delete every issued id and reset the counter to zero.
    ///
    /// Returns the counter value before the reset (ids issued, not stores
    /// present). Zero and no writes when already empty.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] on storage failure or a malformed counter record.
    pub async fn delete_all(&self) -> Result<u64, DbError> {
        let count = self.count().await?.unwrap_or(0);
        if count == 0 {
            return Ok(0);
        }

        self.kv.mdel(&store_keys(count)).await?;
        self.kv
            .set(STORE_COUNT_KEY, encode(&StoreCount { count: 0 })?)
            .await?;

        tracing::info!(deleted = count, "all stores cleared");
        Ok(count)
    }

    /// Distinct retailer names, sorted ascending.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] on storage failure or a malformed counter record.
    pub async fn list_retailers(&self) -> Result<Vec<String>, DbError> {
        let retailers: BTreeSet<String> = self
            .list_all()
            .await?
            .into_iter()
            .map(|s| s.store.retailer)
            .collect();
        Ok(retailers.into_iter().collect())
    }

    /// Clear everything, then load the fixed sample dataset at ids `0..n`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] on storage failure.
    pub async fn seed_sample_stores(&self) -> Result<usize, DbError> {
        self.delete_all().await?;
        let seeded = self.bulk_create(sample_stores()).await?;
        Ok(seeded.len())
    }

    /// Remove stores whose normalized address repeats an earlier one, keeping
    /// the lowest id of each group. Returns the deleted ids.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] on storage failure.
    pub async fn dedupe(&self) -> Result<Vec<u64>, DbError> {
        let mut seen = HashSet::new();
        let duplicates: Vec<u64> = self
            .list_all()
            .await?
            .into_iter()
            .filter(|s| !seen.insert(s.store.normalized_address()))
            .map(|s| s.id)
            .collect();

        if !duplicates.is_empty() {
            let keys: Vec<String> = duplicates.iter().copied().map(store_key).collect();
            self.kv.mdel(&keys).await?;
            tracing::info!(removed = duplicates.len(), "duplicate stores removed");
        }
        Ok(duplicates)
    }
}
