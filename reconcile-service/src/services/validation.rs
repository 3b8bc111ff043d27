//! Row-level checks applied to parsed upload rows before anything is stored.
//!
//! Every problem in the sheet is collected; callers get either the full list
//! of typed records or the full list of messages, never a partial batch.

use crate::models::{Invoice, Transaction};
use crate::spreadsheet::SheetRow;
use chrono::NaiveDate;

pub const MAX_ID_LENGTH: usize = 6;
pub const MAX_PAYMENT_METHOD_LENGTH: usize = 15;

struct RowChecker<'a> {
    row: &'a SheetRow,
    errors: &'a mut Vec<String>,
}

impl<'a> RowChecker<'a> {
    fn fail(&mut self, message: String) {
        self.errors
            .push(format!("Row {}: {}", self.row.row_number, message));
    }

    fn text(&mut self, key: &str, label: &str, max_len: usize) -> Option<String> {
        match self.row.get(key).as_text() {
            None => {
                self.fail(format!("'{}' is required.", label));
                None
            }
            Some(value) if value.chars().count() > max_len => {
                self.fail(format!(
                    "'{}' exceeds maximum length of {}.",
                    label, max_len
                ));
                None
            }
            Some(value) => Some(value),
        }
    }

    fn date(&mut self, key: &str, label: &str) -> Option<NaiveDate> {
        let date = self.row.get(key).as_date();
        if date.is_none() {
            self.fail(format!("'{}' is not a valid date.", label));
        }
        date
    }

    fn amount(&mut self, key: &str) -> Option<f64> {
        match self.row.get(key).as_number() {
            Some(amount) if amount.is_finite() && amount > 0.0 => Some(amount),
            _ => {
                self.fail("'Amount' must be a positive number.".to_string());
                None
            }
        }
    }
}

fn validate_rows<T>(
    rows: &[SheetRow],
    build: impl Fn(&mut RowChecker<'_>) -> Option<T>,
) -> Result<Vec<T>, Vec<String>> {
    let mut errors = Vec::new();
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        let mut checker = RowChecker {
            row,
            errors: &mut errors,
        };
        if let Some(record) = build(&mut checker) {
            records.push(record);
        }
    }

    if errors.is_empty() {
        Ok(records)
    } else {
        Err(errors)
    }
}

pub fn validate_invoices(rows: &[SheetRow]) -> Result<Vec<Invoice>, Vec<String>> {
    validate_rows(rows, |check| {
        // Evaluate every field so each problem in the row is reported.
        let invoice_id = check.text("invoiceId", "Invoice Id", MAX_ID_LENGTH);
        let customer_id = check.text("customerId", "Customer Id", MAX_ID_LENGTH);
        let invoice_date = check.date("invoiceDate", "Invoice Date");
        let amount = check.amount("amount");

        Some(Invoice::new(invoice_id?, customer_id?, invoice_date?, amount?))
    })
}

pub fn validate_transactions(rows: &[SheetRow]) -> Result<Vec<Transaction>, Vec<String>> {
    validate_rows(rows, |check| {
        let transaction_id = check.text("transactionId", "Transaction Id", MAX_ID_LENGTH);
        let payment_method =
            check.text("paymentMethod", "Payment Method", MAX_PAYMENT_METHOD_LENGTH);
        let payment_date = check.date("paymentDate", "Payment Date");
        let amount = check.amount("amount");

        Some(Transaction::new(
            transaction_id?,
            payment_method?,
            payment_date?,
            amount?,
        ))
    })
}
