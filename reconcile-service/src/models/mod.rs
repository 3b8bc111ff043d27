//! Persisted documents for the `invoices` and `transactions` collections.

pub mod invoice;
pub mod transaction;

pub use invoice::{Invoice, InvoiceStatus};
pub use transaction::{Transaction, TransactionStatus};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// Which ledger a record belongs to. Drives collection names, key fields and
/// the wording of operator-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Invoice,
    Transaction,
}

impl RecordKind {
    pub fn collection(&self) -> &'static str {
        match self {
            Self::Invoice => "invoices",
            Self::Transaction => "transactions",
        }
    }

    /// Business key carrying the unique index.
    pub fn key_field(&self) -> &'static str {
        match self {
            Self::Invoice => "invoiceId",
            Self::Transaction => "transactionId",
        }
    }

    /// Date used for listing order (newest first within a status).
    pub fn date_field(&self) -> &'static str {
        match self {
            Self::Invoice => "invoiceDate",
            Self::Transaction => "paymentDate",
        }
    }

    /// Sheet expected in uploaded workbooks.
    pub fn upload_sheet(&self) -> &'static str {
        match self {
            Self::Invoice => "Invoice",
            Self::Transaction => "Transaction",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Invoice => "Invoice",
            Self::Transaction => "Transaction",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Transaction => "transaction",
        }
    }
}

/// Behaviour shared by invoices and transactions so the importer, stores and
/// reports can be written once.
pub trait LedgerRecord:
    Clone + std::fmt::Debug + Send + Sync + Unpin + Serialize + DeserializeOwned + 'static
{
    const KIND: RecordKind;

    fn key(&self) -> &str;
    fn amount(&self) -> f64;
    fn status_label(&self) -> &'static str;
    fn record_date(&self) -> DateTime<Utc>;
    fn created_at(&self) -> DateTime<Utc>;
    fn mark_reconciled(&mut self, at: DateTime<Utc>);
}

pub const STATUS_PENDING: &str = "Pending";
pub const STATUS_RECONCILED: &str = "Reconciled";
