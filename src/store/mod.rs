//! Key-value persistence boundary.
//!
//! Every record family persists through [`KeyValueStore`], injected into its
//! service. The trait mirrors the operations the remote store exposes
//! (`get`/`set`/`list_by_prefix`) and adds two primitives the record
//! services need for correctness: `set_if_absent` for unique-key
//! reservations and `update` for atomic read-modify-write on index keys.
//! Index appends must go through `update`; a bare get-push-set sequence can
//! drop ids under concurrent writers.

mod memory;

pub use memory::MemoryStore;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Store `value` only when `key` is vacant. Returns whether the write
    /// happened.
    fn set_if_absent(&self, key: &str, value: Value) -> Result<bool, StoreError>;

    /// Atomic read-modify-write: `apply` receives the current value (if
    /// any) and returns the replacement, which is stored and returned.
    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<Value>) -> Value,
    ) -> Result<Value, StoreError>;

    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// All entries whose key starts with `prefix`, in key order.
    fn list_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>, StoreError>;
}

/// Error enumeration for persistence failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("stored value is not valid for its record type: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Fetch and decode a record, treating a vacant key as `None`.
pub fn get_record<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

/// Encode and store a record.
pub fn put_record<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    record: &T,
) -> Result<(), StoreError> {
    store.set(key, serde_json::to_value(record)?)
}

/// Append `id` to the string-array index at `key`, atomically.
pub fn push_index(store: &dyn KeyValueStore, key: &str, id: &str) -> Result<(), StoreError> {
    store.update(key, &mut |current| {
        let mut ids = match current {
            Some(Value::Array(ids)) => ids,
            _ => Vec::new(),
        };
        ids.push(Value::String(id.to_string()));
        Value::Array(ids)
    })?;
    Ok(())
}

/// Read the string-array index at `key`; a vacant key is an empty index.
pub fn read_index(store: &dyn KeyValueStore, key: &str) -> Result<Vec<String>, StoreError> {
    let ids = match store.get(key)? {
        Some(Value::Array(ids)) => ids,
        _ => Vec::new(),
    };
    Ok(ids
        .into_iter()
        .filter_map(|value| match value {
            Value::String(id) => Some(id),
            _ => None,
        })
        .collect())
}

/// Drop `id` from the string-array index at `key`, atomically.
pub fn remove_from_index(store: &dyn KeyValueStore, key: &str, id: &str) -> Result<(), StoreError> {
    store.update(key, &mut |current| {
        let ids = match current {
            Some(Value::Array(ids)) => ids,
            _ => Vec::new(),
        };
        Value::Array(
            ids.into_iter()
                .filter(|value| value.as_str() != Some(id))
                .collect(),
        )
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn records_round_trip_through_typed_helpers() {
        let store = MemoryStore::default();
        let record = Sample {
            name: "footbath".to_string(),
            count: 3,
        };

        put_record(&store, "sample:1", &record).expect("put succeeds");
        let loaded: Option<Sample> = get_record(&store, "sample:1").expect("get succeeds");
        assert_eq!(loaded, Some(record));

        let missing: Option<Sample> = get_record(&store, "sample:2").expect("get succeeds");
        assert!(missing.is_none());
    }

    #[test]
    fn push_index_appends_in_order() {
        let store = MemoryStore::default();
        push_index(&store, "user:1:assessments", "a-1").expect("push");
        push_index(&store, "user:1:assessments", "a-2").expect("push");

        let ids = read_index(&store, "user:1:assessments").expect("read");
        assert_eq!(ids, vec!["a-1".to_string(), "a-2".to_string()]);
    }

    #[test]
    fn remove_from_index_drops_only_the_target() {
        let store = MemoryStore::default();
        push_index(&store, "idx", "a").expect("push");
        push_index(&store, "idx", "b").expect("push");
        push_index(&store, "idx", "c").expect("push");

        remove_from_index(&store, "idx", "b").expect("remove");
        assert_eq!(
            read_index(&store, "idx").expect("read"),
            vec!["a".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn set_if_absent_reserves_the_key_once() {
        let store = MemoryStore::default();
        assert!(store
            .set_if_absent("user:email:a@example.com", Value::String("1".into()))
            .expect("first reservation"));
        assert!(!store
            .set_if_absent("user:email:a@example.com", Value::String("2".into()))
            .expect("second reservation"));
        assert_eq!(
            store.get("user:email:a@example.com").expect("get"),
            Some(Value::String("1".into()))
        );
    }
}
