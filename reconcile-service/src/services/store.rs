//! Storage seam for ledger records.
//!
//! Handlers depend on the traits here; `MongoStore` (see `database`) backs
//! them in production and `MemoryStore` backs local runs and tests.

use crate::models::{Invoice, LedgerRecord, Transaction, STATUS_PENDING};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Malformed stored document: {0}")]
    Malformed(String),
}

/// Result of a bulk insert that tolerates uniqueness conflicts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertOutcome {
    pub inserted: u64,
    /// Keys rejected by the uniqueness constraint during the insert itself.
    pub duplicates: Vec<String>,
}

/// Count and amount of the records sharing one status.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusTotal {
    pub status: String,
    pub count: u64,
    pub amount: f64,
}

/// Records moved to `Reconciled` by one settlement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settled {
    pub invoices: u64,
    pub transactions: u64,
}

#[async_trait]
pub trait RecordStore<T: LedgerRecord>: Send + Sync {
    /// Which of `keys` are already stored.
    async fn existing_keys(&self, keys: &[String]) -> Result<HashSet<String>, StoreError>;

    /// Insert every record whose key is not yet taken.
    async fn insert_unique(&self, records: Vec<T>) -> Result<InsertOutcome, StoreError>;

    async fn find_by_keys(&self, keys: &[String]) -> Result<Vec<T>, StoreError>;

    /// Page ordered by status ascending, then record date newest first.
    async fn page(&self, skip: u64, limit: u64) -> Result<Vec<T>, StoreError>;

    async fn count(&self, status: Option<&str>) -> Result<u64, StoreError>;

    /// Pending records in insertion order.
    async fn pending(&self, offset: u64, limit: u64) -> Result<Vec<T>, StoreError>;

    /// All records, optionally restricted to one status, oldest first.
    async fn list(&self, status: Option<&str>) -> Result<Vec<T>, StoreError>;

    async fn status_totals(&self) -> Result<Vec<StatusTotal>, StoreError>;
}

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Mark the given invoices and transactions reconciled as one unit.
    async fn settle(
        &self,
        invoice_ids: &[String],
        transaction_ids: &[String],
    ) -> Result<Settled, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Every storage handle the service needs, behind trait objects.
#[derive(Clone)]
pub struct Stores {
    pub invoices: Arc<dyn RecordStore<Invoice>>,
    pub transactions: Arc<dyn RecordStore<Transaction>>,
    pub ledger: Arc<dyn Ledger>,
}

impl Stores {
    pub fn memory() -> Self {
        Self::from_backend(Arc::new(MemoryStore::new()))
    }

    pub fn from_backend<S>(store: Arc<S>) -> Self
    where
        S: RecordStore<Invoice> + RecordStore<Transaction> + Ledger + 'static,
    {
        Self {
            invoices: store.clone(),
            transactions: store.clone(),
            ledger: store,
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryState {
    invoices: Vec<Invoice>,
    transactions: Vec<Transaction>,
}

/// Selects the table holding a record type inside `MemoryState`.
pub trait MemoryTable: LedgerRecord {
    fn table(state: &MemoryState) -> &Vec<Self>;
    fn table_mut(state: &mut MemoryState) -> &mut Vec<Self>;
}

impl MemoryTable for Invoice {
    fn table(state: &MemoryState) -> &Vec<Self> {
        &state.invoices
    }

    fn table_mut(state: &mut MemoryState) -> &mut Vec<Self> {
        &mut state.invoices
    }
}

impl MemoryTable for Transaction {
    fn table(state: &MemoryState) -> &Vec<Self> {
        &state.transactions
    }

    fn table_mut(state: &mut MemoryState) -> &mut Vec<Self> {
        &mut state.transactions
    }
}

/// In-process store. A single lock covers both tables, so a settlement
/// is observed entirely or not at all.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_status<T: LedgerRecord>(record: &T, status: Option<&str>) -> bool {
    status.map_or(true, |s| record.status_label() == s)
}

#[async_trait]
impl<T: MemoryTable> RecordStore<T> for MemoryStore {
    async fn existing_keys(&self, keys: &[String]) -> Result<HashSet<String>, StoreError> {
        let wanted: HashSet<&str> = keys.iter().map(String::as_str).collect();
        let state = self.state.read().await;
        Ok(T::table(&state)
            .iter()
            .filter(|r| wanted.contains(r.key()))
            .map(|r| r.key().to_string())
            .collect())
    }

    async fn insert_unique(&self, records: Vec<T>) -> Result<InsertOutcome, StoreError> {
        let mut state = self.state.write().await;
        let table = T::table_mut(&mut state);
        let mut taken: HashSet<String> = table.iter().map(|r| r.key().to_string()).collect();

        let mut outcome = InsertOutcome::default();
        for record in records {
            if taken.insert(record.key().to_string()) {
                table.push(record);
                outcome.inserted += 1;
            } else {
                outcome.duplicates.push(record.key().to_string());
            }
        }
        Ok(outcome)
    }

    async fn find_by_keys(&self, keys: &[String]) -> Result<Vec<T>, StoreError> {
        let wanted: HashSet<&str> = keys.iter().map(String::as_str).collect();
        let state = self.state.read().await;
        Ok(T::table(&state)
            .iter()
            .filter(|r| wanted.contains(r.key()))
            .cloned()
            .collect())
    }

    async fn page(&self, skip: u64, limit: u64) -> Result<Vec<T>, StoreError> {
        let state = self.state.read().await;
        let mut records = T::table(&state).clone();
        records.sort_by(|a, b| {
            a.status_label()
                .cmp(b.status_label())
                .then_with(|| b.record_date().cmp(&a.record_date()))
        });
        Ok(records
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    async fn count(&self, status: Option<&str>) -> Result<u64, StoreError> {
        let state = self.state.read().await;
        Ok(T::table(&state)
            .iter()
            .filter(|r| matches_status(*r, status))
            .count() as u64)
    }

    async fn pending(&self, offset: u64, limit: u64) -> Result<Vec<T>, StoreError> {
        let state = self.state.read().await;
        Ok(T::table(&state)
            .iter()
            .filter(|r| r.status_label() == STATUS_PENDING)
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list(&self, status: Option<&str>) -> Result<Vec<T>, StoreError> {
        let state = self.state.read().await;
        let mut records: Vec<T> = T::table(&state)
            .iter()
            .filter(|r| matches_status(*r, status))
            .cloned()
            .collect();
        records.sort_by_key(|r| r.created_at());
        Ok(records)
    }

    async fn status_totals(&self) -> Result<Vec<StatusTotal>, StoreError> {
        let state = self.state.read().await;
        let mut totals: Vec<StatusTotal> = Vec::new();
        for record in T::table(&state) {
            match totals.iter_mut().find(|t| t.status == record.status_label()) {
                Some(total) => {
                    total.count += 1;
                    total.amount += record.amount();
                }
                None => totals.push(StatusTotal {
                    status: record.status_label().to_string(),
                    count: 1,
                    amount: record.amount(),
                }),
            }
        }
        Ok(totals)
    }
}

#[async_trait]
impl Ledger for MemoryStore {
    async fn settle(
        &self,
        invoice_ids: &[String],
        transaction_ids: &[String],
    ) -> Result<Settled, StoreError> {
        let invoice_ids: HashSet<&str> = invoice_ids.iter().map(String::as_str).collect();
        let transaction_ids: HashSet<&str> = transaction_ids.iter().map(String::as_str).collect();
        let now = Utc::now();

        let mut state = self.state.write().await;
        let mut settled = Settled::default();

        for invoice in state
            .invoices
            .iter_mut()
            .filter(|i| invoice_ids.contains(i.invoice_id.as_str()))
        {
            invoice.mark_reconciled(now);
            settled.invoices += 1;
        }
        for transaction in state
            .transactions
            .iter_mut()
            .filter(|t| transaction_ids.contains(t.transaction_id.as_str()))
        {
            transaction.mark_reconciled(now);
            settled.transactions += 1;
        }

        Ok(settled)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
