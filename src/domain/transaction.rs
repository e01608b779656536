use super::ports::BalanceStore;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// A stored record: a flat JSON object of named fields.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// One atomic unit of work against a `BalanceStore`.
///
/// Reads are tracked so that `commit` can refuse to apply staged writes when
/// any record read by the transaction has changed in the meantime. All reads
/// must happen before the first staged write.
#[async_trait]
pub trait StoreTransaction: Send {
    async fn get(&mut self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Stages a field merge into an existing record, applied on commit.
    fn update(&mut self, collection: &str, id: &str, fields: Document);

    /// Applies every staged write, or none of them.
    ///
    /// Returns `PaymentError::TransactionConflict` when a record read by this
    /// transaction was modified after it was read.
    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>);
}

/// The body of a transaction, re-run from scratch on every attempt.
///
/// Implementations must only touch the store through the given transaction so
/// that a discarded attempt leaves no trace.
#[async_trait]
pub trait TransactionBody: Send + Sync {
    type Output: Send;

    async fn run(&self, tx: &mut dyn StoreTransaction) -> Result<Self::Output>;
}

/// How often a conflicting transaction is re-attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Runs `body` inside a fresh transaction until it commits.
///
/// Errors returned by the body roll the attempt back and are returned as-is.
/// Commit conflicts are retried with exponential backoff until the policy's
/// attempt budget is spent.
pub async fn run_transaction<B: TransactionBody>(
    store: &dyn BalanceStore,
    policy: RetryPolicy,
    body: &B,
) -> Result<B::Output> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let mut tx = store.begin().await?;

        let output = match body.run(tx.as_mut()).await {
            Ok(output) => output,
            Err(e) => {
                tx.rollback().await;
                return Err(e);
            }
        };

        match tx.commit().await {
            Ok(()) => return Ok(output),
            Err(PaymentError::TransactionConflict) if attempt < policy.max_attempts => {
                tracing::debug!(attempt, "transaction conflict, retrying");
                tokio::time::sleep(policy.backoff(attempt)).await;
            }
            Err(PaymentError::TransactionConflict) => {
                return Err(PaymentError::TransactionAborted { attempts: attempt });
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory::InMemoryBalanceStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fields(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    /// Increments a counter field, bumping it behind the transaction's back
    /// on the first `interfere` attempts to force conflicts.
    struct Increment<'a> {
        store: &'a InMemoryBalanceStore,
        interfere: u32,
        attempts: AtomicU32,
    }

    #[async_trait]
    impl TransactionBody for Increment<'_> {
        type Output = i64;

        async fn run(&self, tx: &mut dyn StoreTransaction) -> Result<i64> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            let doc = tx.get("counters", "c1").await?.unwrap();
            let value = doc["n"].as_i64().unwrap();
            if attempt <= self.interfere {
                self.store
                    .set("counters", "c1", fields(json!({"n": value + 100})))
                    .await?;
            }
            tx.update("counters", "c1", fields(json!({"n": value + 1})));
            Ok(value + 1)
        }
    }

    #[tokio::test]
    async fn test_conflict_is_retried() {
        let store = InMemoryBalanceStore::new();
        store.set("counters", "c1", fields(json!({"n": 0}))).await.unwrap();

        let body = Increment {
            store: &store,
            interfere: 2,
            attempts: AtomicU32::new(0),
        };
        let result = run_transaction(&store, RetryPolicy::default(), &body)
            .await
            .unwrap();

        assert_eq!(body.attempts.load(Ordering::SeqCst), 3);
        assert_eq!(result, 201);
        let doc = store.get("counters", "c1").await.unwrap().unwrap();
        assert_eq!(doc["n"], json!(201));
    }

    #[tokio::test]
    async fn test_conflicts_exhaust_attempts() {
        let store = InMemoryBalanceStore::new();
        store.set("counters", "c1", fields(json!({"n": 0}))).await.unwrap();

        let body = Increment {
            store: &store,
            interfere: u32::MAX,
            attempts: AtomicU32::new(0),
        };
        let result = run_transaction(&store, RetryPolicy::with_max_attempts(3), &body).await;

        assert!(matches!(
            result,
            Err(PaymentError::TransactionAborted { attempts: 3 })
        ));
        // Only the out-of-band writes landed.
        let doc = store.get("counters", "c1").await.unwrap().unwrap();
        assert_eq!(doc["n"], json!(300));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(1));
        assert_eq!(policy.backoff(3), Duration::from_millis(4));
        assert_eq!(policy.backoff(30), Duration::from_millis(100));
    }

    #[test]
    fn test_at_least_one_attempt() {
        assert_eq!(RetryPolicy::with_max_attempts(0).max_attempts, 1);
    }
}
