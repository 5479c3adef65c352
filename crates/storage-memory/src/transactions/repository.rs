use async_trait::async_trait;
use log::debug;
use std::collections::HashSet;
use tokio::sync::RwLock;

use tallyfolio_core::config::EngineConfig;
use tallyfolio_core::transactions::{
    DerivationRules, NewTransaction, Transaction, TransactionFilter, TransactionStore,
};
use tallyfolio_core::Result;

use crate::errors::StorageError;

/// Append-only transaction store held in memory.
///
/// Every write runs the derivation rules first; nothing invalid is stored.
/// A single lock guards the log, so readers always see whole batches.
pub struct InMemoryTransactionStore {
    rules: DerivationRules,
    transactions: RwLock<Vec<Transaction>>,
}

impl InMemoryTransactionStore {
    pub fn new(rules: DerivationRules) -> Self {
        Self {
            rules,
            transactions: RwLock::new(Vec::new()),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(DerivationRules::from_config(config))
    }

    pub async fn len(&self) -> usize {
        self.transactions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.transactions.read().await.is_empty()
    }

    fn check_unique(existing: &[Transaction], incoming: &[Transaction]) -> Result<()> {
        let mut seen: HashSet<&str> = existing.iter().map(|tx| tx.id.as_str()).collect();
        for tx in incoming {
            if !seen.insert(tx.id.as_str()) {
                return Err(StorageError::DuplicateId(tx.id.clone()).into());
            }
        }
        Ok(())
    }
}

impl Default for InMemoryTransactionStore {
    fn default() -> Self {
        Self::new(DerivationRules::default())
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn create(&self, new_transaction: NewTransaction) -> Result<Transaction> {
        let tx = self.rules.apply(new_transaction)?;

        let mut transactions = self.transactions.write().await;
        Self::check_unique(&transactions, std::slice::from_ref(&tx))?;
        transactions.push(tx.clone());
        debug!("Stored transaction {} ({} {})", tx.id, tx.transaction_type, tx.asset);
        Ok(tx)
    }

    async fn create_batch(
        &self,
        new_transactions: Vec<NewTransaction>,
    ) -> Result<Vec<Transaction>> {
        let created = new_transactions
            .into_iter()
            .map(|tx| self.rules.apply(tx))
            .collect::<Result<Vec<_>>>()?;

        let mut transactions = self.transactions.write().await;
        Self::check_unique(&transactions, &created)?;
        transactions.extend(created.iter().cloned());
        debug!("Stored batch of {} transactions", created.len());
        Ok(created)
    }

    async fn delete_batch(&self, ids: &[String]) -> Result<()> {
        let mut transactions = self.transactions.write().await;

        let present: HashSet<&str> = transactions.iter().map(|tx| tx.id.as_str()).collect();
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| !present.contains(id.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(StorageError::NotFound(missing).into());
        }

        transactions.retain(|tx| !ids.contains(&tx.id));
        debug!("Deleted {} transactions", ids.len());
        Ok(())
    }

    async fn query(&self, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .iter()
            .filter(|tx| filter.matches(tx))
            .cloned()
            .collect())
    }
}
