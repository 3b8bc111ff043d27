use super::{LedgerRecord, RecordKind};
use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TransactionStatus {
    #[default]
    Pending,
    Completed,
    Reconciled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Reconciled => "Reconciled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(rename = "_id")]
    pub id: String,
    pub transaction_id: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub payment_date: DateTime<Utc>,
    pub amount: f64,
    pub payment_method: String,
    #[serde(default)]
    pub status: TransactionStatus,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        transaction_id: String,
        payment_method: String,
        payment_date: NaiveDate,
        amount: f64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            transaction_id,
            payment_date: payment_date.and_time(chrono::NaiveTime::MIN).and_utc(),
            amount,
            payment_method,
            status: TransactionStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

impl LedgerRecord for Transaction {
    const KIND: RecordKind = RecordKind::Transaction;

    fn key(&self) -> &str {
        &self.transaction_id
    }

    fn amount(&self) -> f64 {
        self.amount
    }

    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }

    fn record_date(&self) -> DateTime<Utc> {
        self.payment_date
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn mark_reconciled(&mut self, at: DateTime<Utc>) {
        self.status = TransactionStatus::Reconciled;
        self.updated_at = at;
    }
}
