//! Store backends and their process-wide construction.

pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod seed;

use crate::config::Config;
use crate::domain::ports::BalanceStoreHandle;
use crate::error::Result;
use std::sync::Arc;

/// Opens the configured store and applies the seed file, if any.
///
/// Called once at startup; the returned handle is shared by every request.
pub async fn open_store(config: &Config) -> Result<BalanceStoreHandle> {
    let store: BalanceStoreHandle = match &config.db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(db_path) => {
            tracing::info!(path = %db_path.display(), "opening RocksDB store");
            Arc::new(rocksdb::RocksDBStore::open(db_path)?)
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            tracing::warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
            );
            Arc::new(in_memory::InMemoryBalanceStore::new())
        }
        None => Arc::new(in_memory::InMemoryBalanceStore::new()),
    };

    if let Some(path) = &config.seed {
        let seed = seed::read_seed(path)?;
        let written = seed::apply_seed(store.as_ref(), seed).await?;
        tracing::info!(records = written, path = %path.display(), "seed applied");
    }

    Ok(store)
}
