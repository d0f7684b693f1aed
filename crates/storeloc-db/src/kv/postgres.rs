//! Postgres-backed [`KvStore`] over the `kv_store` table.
//!
//! Every batched operation is a single statement (`ANY($1)` for reads and
//! deletes, `UNNEST` for writes), so enumerating n stores costs one
//! round-trip rather than n.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use super::KvStore;
use crate::DbError;

#[derive(Debug, Clone)]
pub struct PgKvStore {
    pool: PgPool,
}

impl PgKvStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KvStore for PgKvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, DbError> {
        let value = sqlx::query_scalar::<_, Value>("SELECT value FROM kv_store WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), DbError> {
        sqlx::query(
            "INSERT INTO kv_store (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), DbError> {
        sqlx::query("DELETE FROM kv_store WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<Value>>, DbError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<(String, Value)> =
            sqlx::query_as("SELECT key, value FROM kv_store WHERE key = ANY($1)")
                .bind(keys)
                .fetch_all(&self.pool)
                .await?;

        let mut by_key: HashMap<String, Value> = rows.into_iter().collect();
        Ok(keys.iter().map(|k| by_key.remove(k)).collect())
    }

    async fn mset(&self, entries: Vec<(String, Value)>) -> Result<(), DbError> {
        if entries.is_empty() {
            return Ok(());
        }

        let (keys, values): (Vec<String>, Vec<Value>) = entries.into_iter().unzip();
        sqlx::query(
            "INSERT INTO kv_store (key, value) \
             SELECT * FROM UNNEST($1::text[], $2::jsonb[]) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(&keys)
        .bind(&values)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn mdel(&self, keys: &[String]) -> Result<(), DbError> {
        if keys.is_empty() {
            return Ok(());
        }

        sqlx::query("DELETE FROM kv_store WHERE key = ANY($1)")
            .bind(keys)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>, DbError> {
        let rows: Vec<(String, Value)> = sqlx::query_as(
            "SELECT key, value FROM kv_store WHERE key LIKE $1 ESCAPE '\\' ORDER BY key",
        )
        .bind(format!("{}%", escape_like(prefix)))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn reserve(&self, key: &str, by: u64) -> Result<u64, DbError> {
        let overflow = || DbError::CounterOverflow {
            key: key.to_string(),
        };
        let by = i64::try_from(by).map_err(|_| overflow())?;

        // Single-statement upsert: concurrent callers serialize on the row lock,
        // so each receives a disjoint id range.
        let next: i64 = sqlx::query_scalar(
            "INSERT INTO kv_store (key, value) VALUES ($1, jsonb_build_object('count', $2::bigint)) \
             ON CONFLICT (key) DO UPDATE SET value = jsonb_build_object( \
                 'count', COALESCE((kv_store.value->>'count')::bigint, 0) + $2::bigint) \
             RETURNING (value->>'count')::bigint",
        )
        .bind(key)
        .bind(by)
        .fetch_one(&self.pool)
        .await?;

        u64::try_from(next - by).map_err(|_| DbError::MalformedRecord {
            key: key.to_string(),
            reason: format!("counter is negative ({})", next - by),
        })
    }

    async fn ping(&self) -> Result<(), DbError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
