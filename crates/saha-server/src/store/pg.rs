use std::time::Duration;

use async_trait::async_trait;
use saha_shared::store::{Collection, OrderBy, PersistenceError, SortDirection, Store, StoreResult};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id UUID NOT NULL,
    data JSONB NOT NULL,
    PRIMARY KEY (collection, id)
)
"#;

/// All collections live in one JSONB table keyed by `(collection, id)`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, acquire_timeout: Duration) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(acquire_timeout)
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    pub async fn ensure_schema(&self) -> anyhow::Result<()> {
        sqlx::query(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

fn backend(err: sqlx::Error) -> PersistenceError {
    tracing::error!("Database error: {:?}", err);
    PersistenceError::Backend(err.to_string())
}

#[async_trait]
impl Store for PgStore {
    async fn create(&self, collection: Collection, mut record: Value) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        record
            .as_object_mut()
            .ok_or(PersistenceError::NotAnObject)?
            .insert("id".to_string(), Value::String(id.to_string()));

        sqlx::query("INSERT INTO documents (collection, id, data) VALUES ($1, $2, $3)")
            .bind(collection.as_str())
            .bind(id)
            .bind(&record)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        Ok(id)
    }

    async fn get_all(
        &self,
        collection: Collection,
        order_by: Option<OrderBy>,
    ) -> StoreResult<Vec<Value>> {
        let rows = match order_by {
            Some(order) => {
                let direction = match order.direction {
                    SortDirection::Ascending => "ASC",
                    SortDirection::Descending => "DESC",
                };
                let sql = format!(
                    "SELECT data FROM documents WHERE collection = $1 \
                     ORDER BY data->>$2 {direction} NULLS LAST"
                );
                sqlx::query_scalar::<_, Value>(&sql)
                    .bind(collection.as_str())
                    .bind(&order.field)
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query_scalar::<_, Value>(
                    "SELECT data FROM documents WHERE collection = $1",
                )
                .bind(collection.as_str())
                .fetch_all(&self.pool)
                .await
            }
        };
        rows.map_err(backend)
    }

    async fn get_by_id(&self, collection: Collection, id: Uuid) -> StoreResult<Option<Value>> {
        sqlx::query_scalar::<_, Value>(
            "SELECT data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)
    }

    async fn update(&self, collection: Collection, id: Uuid, partial: Value) -> StoreResult<()> {
        if !partial.is_object() {
            return Err(PersistenceError::NotAnObject);
        }

        // `||` replaces top-level keys; the id is never overwritten.
        let result = sqlx::query(
            "UPDATE documents SET data = data || ($3::jsonb - 'id') \
             WHERE collection = $1 AND id = $2",
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(&partial)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(PersistenceError::Missing { collection, id });
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn query_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: Value,
    ) -> StoreResult<Vec<Value>> {
        sqlx::query_scalar::<_, Value>(
            "SELECT data FROM documents WHERE collection = $1 AND data->$2 = $3::jsonb",
        )
        .bind(collection.as_str())
        .bind(field)
        .bind(&value)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)
    }
}
