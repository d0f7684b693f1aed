//! Key layout inside the key-value table.

/// Counter record `{"count": n}`: the next store id to assign.
pub const STORE_COUNT_KEY: &str = "store:count";

pub const ZIP_PREFIX: &str = "zip:";

#[must_use]
pub fn store_key(id: u64) -> String {
    format!("store:{id}")
}

#[must_use]
pub fn zip_key(zip: &str) -> String {
    format!("{ZIP_PREFIX}{zip}")
}

/// Keys `store:0` through `store:{count - 1}`.
#[must_use]
pub fn store_keys(count: u64) -> Vec<String> {
    (0..count).map(store_key).collect()
}
