use super::{LedgerRecord, RecordKind};
use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Reconciled,
    #[serde(rename = "Partially Paid")]
    PartiallyPaid,
    Unpaid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Reconciled => "Reconciled",
            Self::PartiallyPaid => "Partially Paid",
            Self::Unpaid => "Unpaid",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(rename = "_id")]
    pub id: String,
    pub invoice_id: String,
    pub customer_id: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub invoice_date: DateTime<Utc>,
    pub amount: f64,
    pub outstanding_amount: f64,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn new(invoice_id: String, customer_id: String, invoice_date: NaiveDate, amount: f64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            invoice_id,
            customer_id,
            invoice_date: invoice_date.and_time(chrono::NaiveTime::MIN).and_utc(),
            amount,
            outstanding_amount: amount,
            status: InvoiceStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

impl LedgerRecord for Invoice {
    const KIND: RecordKind = RecordKind::Invoice;

    fn key(&self) -> &str {
        &self.invoice_id
    }

    fn amount(&self) -> f64 {
        self.amount
    }

    fn status_label(&self) -> &'static str {
        self.status.as_str()
    }

    fn record_date(&self) -> DateTime<Utc> {
        self.invoice_date
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn mark_reconciled(&mut self, at: DateTime<Utc>) {
        self.status = InvoiceStatus::Reconciled;
        self.outstanding_amount = 0.0;
        self.updated_at = at;
    }
}
