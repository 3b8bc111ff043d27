use crate::models::{Invoice, Transaction};
use crate::services::importer::ImportSummary;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    pub id: String,
    pub invoice_id: String,
    pub customer_id: String,
    pub invoice_date: String,
    pub amount: f64,
    pub outstanding_amount: f64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id,
            invoice_id: invoice.invoice_id,
            customer_id: invoice.customer_id,
            invoice_date: invoice.invoice_date.to_rfc3339(),
            amount: invoice.amount,
            outstanding_amount: invoice.outstanding_amount,
            status: invoice.status.as_str().to_string(),
            created_at: invoice.created_at.to_rfc3339(),
            updated_at: invoice.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub id: String,
    pub transaction_id: String,
    pub payment_method: String,
    pub payment_date: String,
    pub amount: f64,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Transaction> for TransactionResponse {
    fn from(transaction: Transaction) -> Self {
        Self {
            id: transaction.id,
            transaction_id: transaction.transaction_id,
            payment_method: transaction.payment_method,
            payment_date: transaction.payment_date.to_rfc3339(),
            amount: transaction.amount,
            status: transaction.status.as_str().to_string(),
            created_at: transaction.created_at.to_rfc3339(),
            updated_at: transaction.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePageMeta {
    pub total_pages: u64,
    pub current_page: u64,
    pub invoices_per_page: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListResponse {
    pub success: bool,
    pub message: String,
    pub meta_data: InvoicePageMeta,
    pub inv_data: Vec<InvoiceResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPageMeta {
    pub total_pages: u64,
    pub current_page: u64,
    pub transactions_per_page: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionListResponse {
    pub success: bool,
    pub message: String,
    pub meta_data: TransactionPageMeta,
    pub trans_data: Vec<TransactionResponse>,
}

/// Projection used by the reconciliation picker.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingInvoice {
    pub invoice_id: String,
    pub amount: f64,
}

impl From<Invoice> for PendingInvoice {
    fn from(invoice: Invoice) -> Self {
        Self {
            invoice_id: invoice.invoice_id,
            amount: invoice.amount,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransaction {
    pub transaction_id: String,
    pub amount: f64,
}

impl From<Transaction> for PendingTransaction {
    fn from(transaction: Transaction) -> Self {
        Self {
            transaction_id: transaction.transaction_id,
            amount: transaction.amount,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingInvoicesResponse {
    pub success: bool,
    pub message: String,
    pub total_invoices: u64,
    pub pending_inv: Vec<PendingInvoice>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingTransactionsResponse {
    pub success: bool,
    pub message: String,
    pub total_transactions: u64,
    pub pending_trans: Vec<PendingTransaction>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub inserted_count: u64,
    pub duplicate_count: u64,
    pub duplicates: Vec<String>,
}

impl From<ImportSummary> for UploadResponse {
    fn from(summary: ImportSummary) -> Self {
        Self {
            success: true,
            message: "File uploaded successfully.\nPlease check your email for confirmation."
                .to_string(),
            inserted_count: summary.inserted_count,
            duplicate_count: summary.duplicate_count,
            duplicates: summary.duplicates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn invoice_response_uses_wire_names() {
        let invoice = Invoice::new(
            "INV001".into(),
            "CUS001".into(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            99.5,
        );
        let json = serde_json::to_value(InvoiceResponse::from(invoice)).unwrap();

        assert_eq!(json["invoiceId"], "INV001");
        assert_eq!(json["outstandingAmount"], 99.5);
        assert_eq!(json["status"], "Pending");
        assert!(json["invoiceDate"].as_str().unwrap().starts_with("2024-01-15T00:00:00"));
    }

    #[test]
    fn list_envelope_matches_the_listing_contract() {
        let body = serde_json::to_value(TransactionListResponse {
            success: true,
            message: "Transactions fetched successfully.".into(),
            meta_data: TransactionPageMeta {
                total_pages: 2,
                current_page: 1,
                transactions_per_page: 10,
            },
            trans_data: Vec::new(),
        })
        .unwrap();

        assert_eq!(body["metaData"]["transactionsPerPage"], 10);
        assert!(body["transData"].as_array().unwrap().is_empty());
    }
}
