use super::error::ReconcileError;
use super::metrics as reconcile_metrics;
use super::staging::StagingArea;
use super::store::StatusTotal;
use crate::models::{Invoice, LedgerRecord, Transaction, STATUS_PENDING, STATUS_RECONCILED};
use crate::spreadsheet::headers::{
    INVOICE_DOWNLOAD_HEADERS, INVOICE_HEADERS, SUMMARY_HEADERS, TRANSACTION_DOWNLOAD_HEADERS,
    TRANSACTION_HEADERS,
};
use crate::spreadsheet::{write_workbook, CellValue, SheetData, SheetRow};
use serde::Serialize;
use std::time::Instant;

/// Status breakdown of one ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub total: u64,
    pub pending: u64,
    pub reconciled: u64,
    pub total_amount: f64,
    pub pending_amount: f64,
    pub reconciled_amount: f64,
}

/// Fold per-status buckets into a summary. Absent buckets count as zero.
pub fn summarize(buckets: &[StatusTotal]) -> StatusSummary {
    buckets
        .iter()
        .fold(StatusSummary::default(), |mut summary, bucket| {
            summary.total += bucket.count;
            summary.total_amount += bucket.amount;
            match bucket.status.as_str() {
                STATUS_PENDING => {
                    summary.pending += bucket.count;
                    summary.pending_amount += bucket.amount;
                }
                STATUS_RECONCILED => {
                    summary.reconciled += bucket.count;
                    summary.reconciled_amount += bucket.amount;
                }
                _ => {}
            }
            summary
        })
}

pub fn invoice_dump(invoices: &[Invoice]) -> Vec<SheetData> {
    vec![SheetData::from_records(
        "Invoices",
        INVOICE_DOWNLOAD_HEADERS,
        invoices,
    )]
}

pub fn transaction_dump(transactions: &[Transaction]) -> Vec<SheetData> {
    vec![SheetData::from_records(
        "Transactions",
        TRANSACTION_DOWNLOAD_HEADERS,
        transactions,
    )]
}

fn summary_row(row_number: u32, metric: &str, value: f64) -> SheetRow {
    SheetRow::new(row_number)
        .with("metric", CellValue::Text(metric.to_string()))
        .with("value", CellValue::Number(value))
}

/// Reconciled records of both ledgers plus a totals sheet.
pub fn reconciliation_report(invoices: &[Invoice], transactions: &[Transaction]) -> Vec<SheetData> {
    let amount_invoiced: f64 = invoices.iter().map(|i| i.amount()).sum();
    let amount_paid: f64 = transactions.iter().map(|t| t.amount()).sum();

    let summary = SheetData::new("Summary", SUMMARY_HEADERS).with_rows(vec![
        summary_row(2, "Total Reconciled Invoices", invoices.len() as f64),
        summary_row(3, "Total Amount Invoiced (₹)", amount_invoiced),
        summary_row(4, "Total Reconciled Transactions", transactions.len() as f64),
        summary_row(5, "Total Amount Paid (₹)", amount_paid),
    ]);

    vec![
        SheetData::from_records("Reconciled Invoices", INVOICE_HEADERS, invoices),
        SheetData::from_records("Reconciled Transactions", TRANSACTION_HEADERS, transactions),
        summary,
    ]
}

/// Write `sheets` into a staged workbook and return its bytes. The staged
/// file is gone by the time this returns.
pub async fn render_workbook(
    staging: &StagingArea,
    report: &'static str,
    prefix: &str,
    sheets: Vec<SheetData>,
) -> Result<Vec<u8>, ReconcileError> {
    let started = Instant::now();
    let file = staging
        .reserve(prefix)
        .map_err(|e| ReconcileError::Internal(anyhow::anyhow!("failed to stage report: {}", e)))?;

    let file = tokio::task::spawn_blocking(move || {
        write_workbook(file.path(), &sheets).map(|_| file)
    })
    .await
    .map_err(|e| ReconcileError::Internal(anyhow::anyhow!("report writer panicked: {}", e)))??;

    let bytes = tokio::fs::read(file.path())
        .await
        .map_err(|e| ReconcileError::Internal(anyhow::anyhow!("failed to read report: {}", e)))?;

    reconcile_metrics::record_report_duration(report, started.elapsed().as_secs_f64());
    tracing::debug!(report, bytes = bytes.len(), "Report rendered");

    Ok(bytes)
}
