use crate::domain::ports::BalanceStore;
use crate::domain::transaction::{Document, StoreTransaction};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

type Key = (String, String);

#[derive(Debug, Clone)]
struct Versioned {
    version: u64,
    document: Document,
}

#[derive(Default)]
struct Counters {
    transactions_started: AtomicU64,
    writes_applied: AtomicU64,
}

/// A thread-safe in-memory record store with optimistic transactions.
///
/// Every committed write bumps the record's version. A transaction remembers
/// the version of each record it read and refuses to commit if any of them
/// moved. Cloning shares the underlying map.
#[derive(Default, Clone)]
pub struct InMemoryBalanceStore {
    records: Arc<RwLock<HashMap<Key, Versioned>>>,
    counters: Arc<Counters>,
}

impl InMemoryBalanceStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of transactions opened so far.
    pub fn transactions_started(&self) -> u64 {
        self.counters.transactions_started.load(Ordering::SeqCst)
    }

    /// Number of record writes applied so far, transactional or not.
    pub fn writes_applied(&self) -> u64 {
        self.counters.writes_applied.load(Ordering::SeqCst)
    }
}

fn key(collection: &str, id: &str) -> Key {
    (collection.to_string(), id.to_string())
}

#[async_trait]
impl BalanceStore for InMemoryBalanceStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        self.counters
            .transactions_started
            .fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(InMemoryTransaction {
            store: self.clone(),
            reads: HashMap::new(),
            writes: Vec::new(),
        }))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let records = self.records.read().await;
        Ok(records
            .get(&key(collection, id))
            .map(|record| record.document.clone()))
    }

    async fn set(&self, collection: &str, id: &str, document: Document) -> Result<()> {
        let mut records = self.records.write().await;
        let version = records
            .get(&key(collection, id))
            .map_or(1, |record| record.version + 1);
        records.insert(key(collection, id), Versioned { version, document });
        self.counters.writes_applied.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct InMemoryTransaction {
    store: InMemoryBalanceStore,
    /// Version seen per key; `None` when the record did not exist.
    reads: HashMap<Key, Option<u64>>,
    writes: Vec<(Key, Document)>,
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn get(&mut self, collection: &str, id: &str) -> Result<Option<Document>> {
        if !self.writes.is_empty() {
            return Err(PaymentError::StorageError(
                "reads must precede writes in a transaction".to_string(),
            ));
        }
        let records = self.store.records.read().await;
        let record = records.get(&key(collection, id));
        self.reads
            .insert(key(collection, id), record.map(|r| r.version));
        Ok(record.map(|r| r.document.clone()))
    }

    fn update(&mut self, collection: &str, id: &str, fields: Document) {
        self.writes.push((key(collection, id), fields));
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let InMemoryTransaction {
            store,
            reads,
            writes,
        } = *self;
        let mut records = store.records.write().await;

        for (key, seen) in &reads {
            if records.get(key).map(|r| r.version) != *seen {
                return Err(PaymentError::TransactionConflict);
            }
        }
        for ((collection, id), _) in &writes {
            if !records.contains_key(&(collection.clone(), id.clone())) {
                return Err(PaymentError::StorageError(format!(
                    "no record to update at {collection}/{id}"
                )));
            }
        }

        for (key, fields) in writes {
            if let Some(record) = records.get_mut(&key) {
                record.document.extend(fields);
                record.version += 1;
                store
                    .counters
                    .writes_applied
                    .fetch_add(1, Ordering::SeqCst);
            }
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) {}
}
