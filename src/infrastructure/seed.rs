use crate::domain::ports::BalanceStore;
use crate::domain::transaction::Document;
use crate::error::{PaymentError, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Initial records keyed by collection, then by record id.
pub type Seed = BTreeMap<String, BTreeMap<String, Document>>;

/// Reads a seed file.
pub fn read_seed<P: AsRef<Path>>(path: P) -> Result<Seed> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        PaymentError::StorageError(format!("invalid seed file {}: {e}", path.display()))
    })
}

/// Writes every seeded record into the store, replacing existing ones.
///
/// Returns the number of records written.
pub async fn apply_seed(store: &dyn BalanceStore, seed: Seed) -> Result<usize> {
    let mut written = 0;
    for (collection, records) in seed {
        for (id, document) in records {
            store.set(&collection, &id, document).await?;
            written += 1;
        }
    }
    Ok(written)
}
