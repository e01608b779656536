use crate::domain::ports::BalanceStore;
use crate::domain::transaction::{Document, StoreTransaction};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Options, WriteBatch};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing records of every collection.
pub const CF_DOCUMENTS: &str = "documents";

/// A persistent store implementation using RocksDB.
///
/// Records are JSON objects keyed by `collection/id`. Transactions are
/// optimistic: commit happens under a store-wide lock, re-reads every key the
/// transaction read and compares the raw bytes before applying a `WriteBatch`.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    commit_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the "documents" column family exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_documents = ColumnFamilyDescriptor::new(CF_DOCUMENTS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_documents])?;

        Ok(Self {
            db: Arc::new(db),
            commit_lock: Arc::new(Mutex::new(())),
        })
    }

    fn documents(&self) -> Result<&ColumnFamily> {
        self.db.cf_handle(CF_DOCUMENTS).ok_or_else(|| {
            PaymentError::StorageError("Documents column family not found".to_string())
        })
    }

    fn read_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let cf = self.documents()?;
        Ok(self.db.get_cf(cf, key)?)
    }
}

fn record_key(collection: &str, id: &str) -> String {
    format!("{collection}/{id}")
}

fn decode(key: &str, bytes: &[u8]) -> Result<Document> {
    serde_json::from_slice(bytes)
        .map_err(|e| PaymentError::StorageError(format!("Deserialization error at {key}: {e}")))
}

#[async_trait]
impl BalanceStore for RocksDBStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>> {
        Ok(Box::new(RocksDBTransaction {
            store: self.clone(),
            reads: HashMap::new(),
            writes: Vec::new(),
        }))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let key = record_key(collection, id);
        self.read_raw(&key)?
            .map(|bytes| decode(&key, &bytes))
            .transpose()
    }

    async fn set(&self, collection: &str, id: &str, document: Document) -> Result<()> {
        let _guard = self.commit_lock.lock().await;
        let cf = self.documents()?;
        let value = serde_json::to_vec(&document)?;
        self.db.put_cf(cf, record_key(collection, id), value)?;
        Ok(())
    }
}

struct RocksDBTransaction {
    store: RocksDBStore,
    /// Raw bytes seen per key; `None` when the record did not exist.
    reads: HashMap<String, Option<Vec<u8>>>,
    writes: Vec<(String, Document)>,
}

#[async_trait]
impl StoreTransaction for RocksDBTransaction {
    async fn get(&mut self, collection: &str, id: &str) -> Result<Option<Document>> {
        if !self.writes.is_empty() {
            return Err(PaymentError::StorageError(
                "reads must precede writes in a transaction".to_string(),
            ));
        }
        let key = record_key(collection, id);
        let raw = self.store.read_raw(&key)?;
        let document = raw.as_deref().map(|bytes| decode(&key, bytes)).transpose()?;
        self.reads.insert(key, raw);
        Ok(document)
    }

    fn update(&mut self, collection: &str, id: &str, fields: Document) {
        self.writes.push((record_key(collection, id), fields));
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let RocksDBTransaction {
            store,
            reads,
            writes,
        } = *self;
        let _guard = store.commit_lock.lock().await;

        for (key, seen) in &reads {
            if store.read_raw(key)? != *seen {
                return Err(PaymentError::TransactionConflict);
            }
        }

        let mut staged: HashMap<String, Document> = HashMap::new();
        for (key, fields) in writes {
            let mut document = match staged.remove(&key) {
                Some(document) => document,
                None => match store.read_raw(&key)? {
                    Some(bytes) => decode(&key, &bytes)?,
                    None => {
                        return Err(PaymentError::StorageError(format!(
                            "no record to update at {key}"
                        )));
                    }
                },
            };
            document.extend(fields);
            staged.insert(key, document);
        }

        let cf = store.documents()?;
        let mut batch = WriteBatch::default();
        for (key, document) in &staged {
            batch.put_cf(cf, key, serde_json::to_vec(document)?);
        }
        store.db.write(batch)?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) {}
}
