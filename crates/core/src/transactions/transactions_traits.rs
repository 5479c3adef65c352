use super::transactions_model::{NewTransaction, Transaction, TransactionFilter};
use crate::Result;
use async_trait::async_trait;

/// Contract for the append-only transaction store the engine reads from.
///
/// Implementations must run the derivation rules on every input and reject
/// invalid transactions before anything is written.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn create(&self, new_transaction: NewTransaction) -> Result<Transaction>;

    /// Writes every transaction or none of them.
    async fn create_batch(&self, new_transactions: Vec<NewTransaction>) -> Result<Vec<Transaction>>;

    /// Compensating removal of transactions written by an earlier `create_batch`.
    async fn delete_batch(&self, ids: &[String]) -> Result<()>;

    /// Matching transactions in insertion order.
    async fn query(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>>;
}
