use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{json, Value};
use storeloc_core::StoreCount;
use tokio::sync::Mutex;

use super::KvStore;
use crate::{records, DbError};

/// In-process [`KvStore`]. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryKvStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, DbError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), DbError> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), DbError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Value>>, DbError> {
        let entries = self.entries.lock().await;
        Ok(keys.iter().map(|k| entries.get(k).cloned()).collect())
    }

    async fn mset(&self, entries: Vec<(String, Value)>) -> Result<(), DbError> {
        self.entries.lock().await.extend(entries);
        Ok(())
    }

    async fn mdel(&self, keys: &[String]) -> Result<(), DbError> {
        let mut entries = self.entries.lock().await;
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>, DbError> {
        let entries = self.entries.lock().await;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn reserve(&self, key: &str, by: u64) -> Result<u64, DbError> {
        let mut entries = self.entries.lock().await;
        let current = match entries.get(key) {
            Some(value) => records::decode::<StoreCount>(key, value.clone())?.count,
            None => 0,
        };
        let next = current
            .checked_add(by)
            .ok_or_else(|| DbError::CounterOverflow {
                key: key.to_string(),
            })?;
        entries.insert(key.to_string(), json!({ "count": next }));
        Ok(current)
    }

    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mget_is_aligned_with_requested_keys() {
        let kv = MemoryKvStore::new();
        kv.set("a", json!(1)).await.unwrap();
        kv.set("c", json!(3)).await.unwrap();

        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let values = kv.mget(&keys).await.unwrap();
        assert_eq!(values, vec![Some(json!(1)), None, Some(json!(3))]);
    }

    #[tokio::test]
    async fn scan_prefix_returns_only_matching_keys_in_order() {
        let kv = MemoryKvStore::new();
        kv.mset(vec![
            ("zip:94102".to_string(), json!({"lat": 1.0, "lon": 2.0})),
            ("store:0".to_string(), json!({})),
            ("zip:10001".to_string(), json!({"lat": 3.0, "lon": 4.0})),
            ("zipper".to_string(), json!(null)),
        ])
        .await
        .unwrap();

        let keys: Vec<String> = kv
            .scan_prefix("zip:")
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["zip:10001", "zip:94102"]);
    }

    #[tokio::test]
    async fn reserve_starts_from_zero_and_advances() {
        let kv = MemoryKvStore::new();
        assert_eq!(kv.reserve("store:count", 3).await.unwrap(), 0);
        assert_eq!(kv.reserve("store:count", 1).await.unwrap(), 3);
        assert_eq!(kv.get("store:count").await.unwrap(), Some(json!({"count": 4})));
    }

    #[tokio::test]
    async fn reserve_rejects_malformed_counter() {
        let kv = MemoryKvStore::new();
        kv.set("store:count", json!({"count": "many"})).await.unwrap();
        let err = kv.reserve("store:count", 1).await.unwrap_err();
        assert!(matches!(err, DbError::MalformedRecord { .. }));
    }

    #[tokio::test]
    async fn mdel_ignores_missing_keys() {
        let kv = MemoryKvStore::new();
        kv.set("store:0", json!({})).await.unwrap();
        kv.mdel(&["store:0".to_string(), "store:9".to_string()])
            .await
            .unwrap();
        assert_eq!(kv.get("store:0").await.unwrap(), None);
    }
}
