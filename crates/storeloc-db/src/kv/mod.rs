//! Key-value storage contract and its implementations.
//!
//! - [`PgKvStore`]: durable, one `kv_store` row per key with a JSONB value
//! - [`MemoryKvStore`]: process-local, used in development and tests

mod memory;
mod postgres;

pub use memory::MemoryKvStore;
pub use postgres::PgKvStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::DbError;

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, DbError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), DbError>;

    /// Deleting a missing key is not an error.
    async fn del(&self, key: &str) -> Result<(), DbError>;

    /// One round-trip for all `keys`. The result is aligned with `keys`:
    /// position `i` is `None` when `keys[i]` is absent.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Value>>, DbError>;

    /// Upsert every entry in one round-trip. Keys must be distinct.
    async fn mset(&self, entries: Vec<(String, Value)>) -> Result<(), DbError>;

    async fn mdel(&self, keys: &[String]) -> Result<(), DbError>;

    /// All entries whose key starts with `prefix`, ordered by key.
    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>, DbError>;

    /// Atomically advance the counter record `{"count": n}` at `key` by `by`
    /// and return the count before the increment. A missing record counts as
    /// zero.
    async fn reserve(&self, key: &str, by: u64) -> Result<u64, DbError>;

    /// Cheap liveness check used by `/health`.
    async fn ping(&self) -> Result<(), DbError>;
}
