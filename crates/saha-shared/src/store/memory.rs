use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use super::{
    compare_field, Collection, OrderBy, PersistenceError, SortDirection, Store, StoreResult,
};

/// Process-local store used by tests and by the server when no database
/// is configured. Keeps insertion order per collection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<(Uuid, Value)>>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with a backend error until reset.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(PersistenceError::Backend("write rejected".to_string()));
        }
        Ok(())
    }

    fn poisoned<T>(_: T) -> PersistenceError {
        PersistenceError::Backend("memory store lock poisoned".to_string())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create(&self, collection: Collection, mut record: Value) -> StoreResult<Uuid> {
        self.check_writable()?;
        let id = Uuid::new_v4();
        record
            .as_object_mut()
            .ok_or(PersistenceError::NotAnObject)?
            .insert("id".to_string(), Value::String(id.to_string()));

        let mut collections = self.collections.write().map_err(Self::poisoned)?;
        collections.entry(collection).or_default().push((id, record));
        tracing::trace!(%collection, %id, "memory store: created record");
        Ok(id)
    }

    async fn get_all(
        &self,
        collection: Collection,
        order_by: Option<OrderBy>,
    ) -> StoreResult<Vec<Value>> {
        let collections = self.collections.read().map_err(Self::poisoned)?;
        let mut records: Vec<Value> = collections
            .get(&collection)
            .map(|records| records.iter().map(|(_, v)| v.clone()).collect())
            .unwrap_or_default();

        if let Some(order) = order_by {
            records.sort_by(|a, b| {
                let ord = compare_field(a, b, &order.field);
                match order.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
        }
        Ok(records)
    }

    async fn get_by_id(&self, collection: Collection, id: Uuid) -> StoreResult<Option<Value>> {
        let collections = self.collections.read().map_err(Self::poisoned)?;
        Ok(collections
            .get(&collection)
            .and_then(|records| records.iter().find(|(rid, _)| *rid == id))
            .map(|(_, v)| v.clone()))
    }

    async fn update(&self, collection: Collection, id: Uuid, partial: Value) -> StoreResult<()> {
        self.check_writable()?;
        let Value::Object(fields) = partial else {
            return Err(PersistenceError::NotAnObject);
        };

        let mut collections = self.collections.write().map_err(Self::poisoned)?;
        let record = collections
            .get_mut(&collection)
            .and_then(|records| records.iter_mut().find(|(rid, _)| *rid == id))
            .map(|(_, v)| v)
            .ok_or(PersistenceError::Missing { collection, id })?;

        let target = record.as_object_mut().ok_or(PersistenceError::NotAnObject)?;
        for (key, value) in fields {
            if key != "id" {
                target.insert(key, value);
            }
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> StoreResult<()> {
        self.check_writable()?;
        let mut collections = self.collections.write().map_err(Self::poisoned)?;
        if let Some(records) = collections.get_mut(&collection) {
            records.retain(|(rid, _)| *rid != id);
        }
        Ok(())
    }

    async fn query_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: Value,
    ) -> StoreResult<Vec<Value>> {
        let collections = self.collections.read().map_err(Self::poisoned)?;
        Ok(collections
            .get(&collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|(_, v)| v.get(field) == Some(&value))
                    .map(|(_, v)| v.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    #[tokio::test]
    async fn create_assigns_id_into_record() {
        let store = MemoryStore::new();
        let id = store
            .create(Collection::Tasks, json!({ "title": "Ziyaret planı" }))
            .await
            .unwrap();

        let record = store.get_by_id(Collection::Tasks, id).await.unwrap().unwrap();
        assert_eq!(record["id"], json!(id.to_string()));
        assert_eq!(record["title"], "Ziyaret planı");
    }

    #[tokio::test]
    async fn update_merges_top_level_fields() {
        let store = MemoryStore::new();
        let id = store
            .create(Collection::Trainings, json!({ "title": "A", "category": "x" }))
            .await
            .unwrap();

        store
            .update(Collection::Trainings, id, json!({ "title": "B", "id": "ignored" }))
            .await
            .unwrap();

        let record = store.get_by_id(Collection::Trainings, id).await.unwrap().unwrap();
        assert_eq!(record["title"], "B");
        assert_eq!(record["category"], "x");
        assert_eq!(record["id"], json!(id.to_string()));
    }

    #[tokio::test]
    async fn update_of_missing_record_fails() {
        let store = MemoryStore::new();
        let err = store
            .update(Collection::Tasks, Uuid::new_v4(), json!({ "title": "x" }))
            .await
            .unwrap_err();
        assert_matches!(
            err,
            PersistenceError::Missing {
                collection: Collection::Tasks,
                ..
            }
        );
    }

    #[tokio::test]
    async fn get_all_orders_and_query_filters() {
        let store = MemoryStore::new();
        for (name, unit) in [("b", "Ankara"), ("a", "İzmir"), ("c", "Ankara")] {
            store
                .create(Collection::Users, json!({ "username": name, "unit": unit }))
                .await
                .unwrap();
        }

        let ordered = store
            .get_all(Collection::Users, Some(OrderBy::desc("username")))
            .await
            .unwrap();
        let names: Vec<_> = ordered.iter().map(|u| u["username"].as_str().unwrap()).collect();
        assert_eq!(names, ["c", "b", "a"]);

        let ankara = store
            .query_by_field(Collection::Users, "unit", json!("Ankara"))
            .await
            .unwrap();
        assert_eq!(ankara.len(), 2);
    }

    #[tokio::test]
    async fn failing_writes_leave_records_untouched() {
        let store = MemoryStore::new();
        let id = store
            .create(Collection::Tasks, json!({ "title": "x" }))
            .await
            .unwrap();

        store.set_fail_writes(true);
        let err = store
            .update(Collection::Tasks, id, json!({ "title": "y" }))
            .await
            .unwrap_err();
        assert_matches!(err, PersistenceError::Backend(_));

        store.set_fail_writes(false);
        let record = store.get_by_id(Collection::Tasks, id).await.unwrap().unwrap();
        assert_eq!(record["title"], "x");
    }
}
