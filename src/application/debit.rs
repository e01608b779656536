use crate::domain::account::{Balance, USERS, UserAccount};
use crate::domain::ports::BalanceStoreHandle;
use crate::domain::request::DebitRequest;
use crate::domain::transaction::{RetryPolicy, StoreTransaction, TransactionBody, run_transaction};
use crate::error::{PaymentError, Result};
use async_trait::async_trait;

/// Debits user balances through the shared store handle.
///
/// The service holds no mutable state of its own. All ordering between
/// concurrent debits of the same account comes from the store's transactions.
pub struct DebitService {
    store: BalanceStoreHandle,
    policy: RetryPolicy,
}

impl DebitService {
    /// Creates a new `DebitService`.
    ///
    /// # Arguments
    ///
    /// * `store` - The store holding user records, initialised once per process.
    /// * `policy` - How often a conflicting transaction is re-attempted.
    pub fn new(store: BalanceStoreHandle, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    /// Atomically checks the balance covers the amount and decrements it.
    ///
    /// Returns the balance left after the debit. Unknown users and
    /// insufficient funds abort the transaction without writing anything.
    pub async fn debit(&self, request: &DebitRequest) -> Result<Balance> {
        run_transaction(self.store.as_ref(), self.policy, &ConditionalDebit { request }).await
    }
}

struct ConditionalDebit<'a> {
    request: &'a DebitRequest,
}

#[async_trait]
impl TransactionBody for ConditionalDebit<'_> {
    type Output = Balance;

    async fn run(&self, tx: &mut dyn StoreTransaction) -> Result<Balance> {
        let user_id = &self.request.user_id;
        let document = tx
            .get(USERS, user_id)
            .await?
            .ok_or_else(|| PaymentError::UserNotFound(user_id.clone()))?;

        let mut account = UserAccount::from_document(user_id, &document)?;
        let remaining = account.debit(self.request.amount)?;
        tx.update(USERS, user_id, account.balance_fields()?);
        Ok(remaining)
    }
}
