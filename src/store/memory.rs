use std::collections::BTreeMap;
use std::sync::Mutex;

use serde_json::Value;

use super::{KeyValueStore, StoreError};

/// In-process store backed by an ordered map. A single mutex serializes
/// writers, so `update` is atomic with respect to concurrent appends.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, Value>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }

    fn set_if_absent(&self, key: &str, value: Value) -> Result<bool, StoreError> {
        let mut entries = self.lock()?;
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), value);
        Ok(true)
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<Value>) -> Value,
    ) -> Result<Value, StoreError> {
        let mut entries = self.lock()?;
        let next = apply(entries.get(key).cloned());
        entries.insert(key.to_string(), next.clone());
        Ok(next)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn list_by_prefix(&self, prefix: &str) -> Result<Vec<(String, Value)>, StoreError> {
        let entries = self.lock()?;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn list_by_prefix_is_bounded_and_ordered() {
        let store = MemoryStore::default();
        store.set("alert:2", Value::Null).expect("set");
        store.set("alert:1", Value::Null).expect("set");
        store.set("assessment:1", Value::Null).expect("set");

        let alerts = store.list_by_prefix("alert:").expect("list");
        let keys: Vec<&str> = alerts.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["alert:1", "alert:2"]);
    }

    #[test]
    fn concurrent_updates_never_drop_appends() {
        let store = Arc::new(MemoryStore::default());
        let writers = 8;
        let appends = 50;

        let handles: Vec<_> = (0..writers)
            .map(|writer| {
                let store = store.clone();
                thread::spawn(move || {
                    for n in 0..appends {
                        store
                            .update("index", &mut |current| {
                                let mut ids = match current {
                                    Some(Value::Array(ids)) => ids,
                                    _ => Vec::new(),
                                };
                                ids.push(Value::String(format!("{writer}-{n}")));
                                Value::Array(ids)
                            })
                            .expect("update succeeds");
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("writer thread panicked");
        }

        let stored = store.get("index").expect("get").expect("index present");
        let ids = stored.as_array().expect("array");
        assert_eq!(ids.len(), writers * appends);
    }

    #[test]
    fn delete_removes_the_entry() {
        let store = MemoryStore::default();
        store.set("session:tok", Value::String("1".into())).expect("set");
        store.delete("session:tok").expect("delete");
        assert_eq!(store.get("session:tok").expect("get"), None);
    }
}
