//! Typed decoding of key-value payloads.
//!
//! Values are stored as untyped JSON; everything read back goes through
//! [`decode`], which deserializes into the record type and then runs its
//! validation.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use storeloc_core::{RecordError, Store, StoreCount, ZipCoordinate};

use crate::DbError;

pub trait Record: Serialize + DeserializeOwned {
    /// # Errors
    ///
    /// Returns [`RecordError`] when the decoded value violates the record's
    /// invariants.
    fn validate(&self) -> Result<(), RecordError>;
}

impl Record for Store {
    fn validate(&self) -> Result<(), RecordError> {
        Store::validate(self)
    }
}

impl Record for ZipCoordinate {
    fn validate(&self) -> Result<(), RecordError> {
        ZipCoordinate::validate(self)
    }
}

impl Record for StoreCount {
    fn validate(&self) -> Result<(), RecordError> {
        Ok(())
    }
}

/// Decode and validate the value stored at `key`.
///
/// # Errors
///
/// Returns [`DbError::MalformedRecord`] if the JSON does not match `T` or
/// fails validation.
pub fn decode<T: Record>(key: &str, value: Value) -> Result<T, DbError> {
    let record: T = serde_json::from_value(value).map_err(|e| DbError::MalformedRecord {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    record.validate().map_err(|e| DbError::MalformedRecord {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    Ok(record)
}

/// # Errors
///
/// Returns [`DbError::Encode`] if serialization fails.
pub fn encode<T: Record>(record: &T) -> Result<Value, DbError> {
    Ok(serde_json::to_value(record)?)
}
