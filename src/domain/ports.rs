use super::transaction::{Document, StoreTransaction};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// A transactional record store keyed by `(collection, id)`.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Opens a transaction. Nothing is visible to other callers until commit.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>>;

    /// Reads a record outside of any transaction.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Replaces a record outside of any transaction.
    async fn set(&self, collection: &str, id: &str, document: Document) -> Result<()>;
}

pub type BalanceStoreHandle = Arc<dyn BalanceStore>;
