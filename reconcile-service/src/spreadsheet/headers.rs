//! Declared header→field mappings for uploads and exports.

/// Correspondence between a sheet column header and a record field key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub header: &'static str,
    pub key: &'static str,
}

const fn col(header: &'static str, key: &'static str) -> ColumnMapping {
    ColumnMapping { header, key }
}

pub const INVOICE_HEADERS: &[ColumnMapping] = &[
    col("Invoice ID", "invoiceId"),
    col("Customer ID", "customerId"),
    col("Invoice Date", "invoiceDate"),
    col("Amount", "amount"),
];

pub const TRANSACTION_HEADERS: &[ColumnMapping] = &[
    col("Transaction ID", "transactionId"),
    col("Payment Method", "paymentMethod"),
    col("Payment Date", "paymentDate"),
    col("Amount", "amount"),
];

pub const INVOICE_DOWNLOAD_HEADERS: &[ColumnMapping] = &[
    col("Invoice ID", "invoiceId"),
    col("Customer ID", "customerId"),
    col("Invoice Date", "invoiceDate"),
    col("Amount", "amount"),
    col("Status", "status"),
];

pub const TRANSACTION_DOWNLOAD_HEADERS: &[ColumnMapping] = &[
    col("Transaction ID", "transactionId"),
    col("Payment Method", "paymentMethod"),
    col("Payment Date", "paymentDate"),
    col("Amount", "amount"),
    col("Status", "status"),
];

pub const SUMMARY_HEADERS: &[ColumnMapping] = &[col("Metric", "metric"), col("Value", "value")];
