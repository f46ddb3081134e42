//! Document-store capability the panel persists through.
//!
//! Records are JSON objects grouped in collections. Writes replace whole
//! top-level fields, so two sessions writing the same record end with the
//! later write (last-write-wins, no merge).

use std::cmp::Ordering;
use std::fmt;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use uuid::Uuid;

mod memory;

pub use memory::MemoryStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Trainings,
    Tasks,
    Users,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trainings => "trainings",
            Self::Tasks => "tasks",
            Self::Users => "users",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Descending,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Stored record could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{collection} record {id} does not exist")]
    Missing { collection: Collection, id: Uuid },

    #[error("Records must be JSON objects")]
    NotAnObject,
}

pub type StoreResult<T> = Result<T, PersistenceError>;

/// Collection-scoped CRUD plus equality query.
///
/// `create` assigns the id and writes it into the record's `id` field.
/// `update` merges the given top-level fields into the stored record and
/// fails with [`PersistenceError::Missing`] when the record is absent.
/// `delete` of an absent record succeeds.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create(&self, collection: Collection, record: Value) -> StoreResult<Uuid>;

    async fn get_all(
        &self,
        collection: Collection,
        order_by: Option<OrderBy>,
    ) -> StoreResult<Vec<Value>>;

    async fn get_by_id(&self, collection: Collection, id: Uuid) -> StoreResult<Option<Value>>;

    async fn update(&self, collection: Collection, id: Uuid, partial: Value) -> StoreResult<()>;

    async fn delete(&self, collection: Collection, id: Uuid) -> StoreResult<()>;

    async fn query_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: Value,
    ) -> StoreResult<Vec<Value>>;
}

/// Serialize `record`, drop any `id` it carries and create it.
pub async fn insert<T: Serialize + Sync>(
    store: &dyn Store,
    collection: Collection,
    record: &T,
) -> StoreResult<Uuid> {
    let mut value = serde_json::to_value(record)?;
    value
        .as_object_mut()
        .ok_or(PersistenceError::NotAnObject)?
        .remove("id");
    store.create(collection, value).await
}

pub async fn fetch<T: DeserializeOwned>(
    store: &dyn Store,
    collection: Collection,
    id: Uuid,
) -> StoreResult<Option<T>> {
    match store.get_by_id(collection, id).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub async fn fetch_all<T: DeserializeOwned>(
    store: &dyn Store,
    collection: Collection,
    order_by: Option<OrderBy>,
) -> StoreResult<Vec<T>> {
    decode_all(store.get_all(collection, order_by).await?)
}

pub async fn find_by<T: DeserializeOwned>(
    store: &dyn Store,
    collection: Collection,
    field: &str,
    value: Value,
) -> StoreResult<Vec<T>> {
    decode_all(store.query_by_field(collection, field, value).await?)
}

fn decode_all<T: DeserializeOwned>(values: Vec<Value>) -> StoreResult<Vec<T>> {
    values
        .into_iter()
        .map(|value| serde_json::from_value(value).map_err(PersistenceError::from))
        .collect()
}

/// Ordering used by backends that sort in process. Missing and null
/// fields sort after every present value.
pub fn compare_field(a: &Value, b: &Value, field: &str) -> Ordering {
    match (a.get(field), b.get(field)) {
        (Some(x), Some(y)) => compare_values(x, y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        _ => Ordering::Equal,
    }
}
