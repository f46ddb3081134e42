mod pg;

use std::sync::Arc;
use std::time::Duration;

use saha_shared::store::{MemoryStore, Store};

pub use pg::PgStore;

use crate::config::Config;

/// PostgreSQL when a database is configured, otherwise a process-local
/// store that is lost on restart.
pub async fn open(config: &Config) -> anyhow::Result<Arc<dyn Store>> {
    match &config.database_url {
        Some(url) => {
            let timeout = Duration::from_secs(config.request_timeout_secs);
            let store = PgStore::connect(url, timeout).await?;
            tracing::info!("Using PostgreSQL document store");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; data is kept in memory only");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
