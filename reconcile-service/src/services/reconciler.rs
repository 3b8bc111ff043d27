use super::error::ReconcileError;
use super::metrics as reconcile_metrics;
use super::store::{Ledger, RecordStore};
use crate::models::{Invoice, LedgerRecord, Transaction};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconcileOutcome {
    pub invoices: u64,
    pub transactions: u64,
    pub amount: f64,
}

fn distinct(ids: &[String]) -> Vec<String> {
    ids.iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn total<T: LedgerRecord>(records: &[T]) -> f64 {
    records.iter().map(|r| r.amount()).sum()
}

/// Pair the selected invoices with the selected transactions.
///
/// Both sides must add up to exactly the same amount; on success every
/// matched record on both sides is marked `Reconciled` in one storage unit.
/// Identifiers that match nothing are ignored.
pub async fn reconcile(
    invoices: &dyn RecordStore<Invoice>,
    transactions: &dyn RecordStore<Transaction>,
    ledger: &dyn Ledger,
    selected_invoices: &[String],
    selected_transactions: &[String],
) -> Result<ReconcileOutcome, ReconcileError> {
    let invoice_ids = distinct(selected_invoices);
    let transaction_ids = distinct(selected_transactions);

    if invoice_ids.is_empty() || transaction_ids.is_empty() {
        reconcile_metrics::record_reconciliation("empty_selection");
        return Err(ReconcileError::EmptySelection);
    }

    let matched_invoices = invoices.find_by_keys(&invoice_ids).await?;
    let matched_transactions = transactions.find_by_keys(&transaction_ids).await?;

    let invoice_total = total(&matched_invoices);
    let transaction_total = total(&matched_transactions);

    if invoice_total != transaction_total {
        tracing::warn!(
            invoice_total,
            transaction_total,
            invoices = matched_invoices.len(),
            transactions = matched_transactions.len(),
            "Reconciliation rejected: totals differ"
        );
        reconcile_metrics::record_reconciliation("amount_mismatch");
        return Err(ReconcileError::AmountMismatch {
            invoice_total,
            transaction_total,
        });
    }

    let invoice_keys: Vec<String> = matched_invoices.iter().map(|r| r.key().to_string()).collect();
    let transaction_keys: Vec<String> = matched_transactions
        .iter()
        .map(|r| r.key().to_string())
        .collect();

    let settled = ledger.settle(&invoice_keys, &transaction_keys).await?;

    reconcile_metrics::record_reconciliation("reconciled");
    tracing::info!(
        invoices = settled.invoices,
        transactions = settled.transactions,
        amount = invoice_total,
        "Reconciliation committed"
    );

    Ok(ReconcileOutcome {
        invoices: settled.invoices,
        transactions: settled.transactions,
        amount: invoice_total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InvoiceStatus, TransactionStatus};
    use crate::services::store::MemoryStore;
    use chrono::NaiveDate;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    async fn seeded() -> MemoryStore {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let store = MemoryStore::new();
        store
            .insert_unique(vec![
                Invoice::new("A1".into(), "C1".into(), date, 100.0),
                Invoice::new("A2".into(), "C1".into(), date, 50.0),
            ])
            .await
            .unwrap();
        store
            .insert_unique(vec![Transaction::new("T1".into(), "UPI".into(), date, 150.0)])
            .await
            .unwrap();
        store
    }

    async fn run(store: &MemoryStore, inv: &[&str], txn: &[&str]) -> Result<ReconcileOutcome, ReconcileError> {
        reconcile(store, store, store, &ids(inv), &ids(txn)).await
    }

    #[tokio::test]
    async fn matching_totals_reconcile_both_sides() {
        let store = seeded().await;

        let outcome = run(&store, &["A1", "A2"], &["T1"]).await.unwrap();

        assert_eq!(outcome.invoices, 2);
        assert_eq!(outcome.transactions, 1);
        assert_eq!(outcome.amount, 150.0);

        let invoices: Vec<Invoice> = store.list(None).await.unwrap();
        assert!(invoices
            .iter()
            .all(|i| i.status == InvoiceStatus::Reconciled && i.outstanding_amount == 0.0));
        let transactions: Vec<Transaction> = store.list(None).await.unwrap();
        assert_eq!(transactions[0].status, TransactionStatus::Reconciled);
    }

    #[tokio::test]
    async fn differing_totals_change_nothing() {
        let store = seeded().await;

        let err = run(&store, &["A1"], &["T1"]).await.unwrap_err();

        match err {
            ReconcileError::AmountMismatch {
                invoice_total,
                transaction_total,
            } => {
                assert_eq!(invoice_total, 100.0);
                assert_eq!(transaction_total, 150.0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let invoices: Vec<Invoice> = store.list(None).await.unwrap();
        assert!(invoices.iter().all(|i| i.status == InvoiceStatus::Pending));
        let transactions: Vec<Transaction> = store.list(None).await.unwrap();
        assert_eq!(transactions[0].status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn empty_selection_is_rejected() {
        let store = seeded().await;

        assert!(matches!(
            run(&store, &[], &["T1"]).await,
            Err(ReconcileError::EmptySelection)
        ));
        assert!(matches!(
            run(&store, &["A1"], &["  "]).await,
            Err(ReconcileError::EmptySelection)
        ));
    }

    #[tokio::test]
    async fn unknown_and_repeated_ids_are_ignored() {
        let store = seeded().await;

        let outcome = run(&store, &["A1", "A2", "A2", "ZZ9"], &["T1", "T1"])
            .await
            .unwrap();

        assert_eq!(outcome.invoices, 2);
        assert_eq!(outcome.transactions, 1);
    }
}
