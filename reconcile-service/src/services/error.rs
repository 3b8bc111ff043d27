use super::mailer::MailError;
use super::store::StoreError;
use crate::models::RecordKind;
use crate::spreadsheet::SpreadsheetError;
use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("File is required")]
    MissingFile,

    #[error("{0}")]
    UnsupportedMimeOrSize(String),

    #[error("{0}")]
    SchemaMismatch(SpreadsheetError),

    #[error("Unable to read the uploaded file: {0}")]
    UnreadableFile(SpreadsheetError),

    #[error("Failed to build spreadsheet: {0}")]
    ReportWrite(SpreadsheetError),

    #[error("Validation errors detected in the {} file", .kind.label())]
    FieldValidation {
        kind: RecordKind,
        errors: Vec<String>,
    },

    #[error("Select at least one invoice and one transaction to reconcile.")]
    EmptySelection,

    #[error("The sum of selected invoices and transactions must match.")]
    AmountMismatch {
        invoice_total: f64,
        transaction_total: f64,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Mail delivery failed: {0}")]
    MailDelivery(#[from] MailError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<SpreadsheetError> for ReconcileError {
    fn from(err: SpreadsheetError) -> Self {
        if err.is_schema_mismatch() {
            ReconcileError::SchemaMismatch(err)
        } else if matches!(err, SpreadsheetError::Write(_)) {
            ReconcileError::ReportWrite(err)
        } else {
            ReconcileError::UnreadableFile(err)
        }
    }
}

impl From<ReconcileError> for AppError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::MissingFile => AppError::BadRequest(anyhow::anyhow!("File is required")),
            ReconcileError::UnsupportedMimeOrSize(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            ReconcileError::SchemaMismatch(e) => AppError::BadRequest(anyhow::anyhow!(e.to_string())),
            ReconcileError::UnreadableFile(e) => {
                AppError::BadRequest(anyhow::anyhow!("Unable to read the uploaded file: {}", e))
            }
            ReconcileError::ReportWrite(e) => AppError::InternalError(anyhow::anyhow!(e.to_string())),
            ReconcileError::FieldValidation { errors, .. } => AppError::rejected(
                "Validation errors detected in the file.\nPlease check your email for further details.",
                errors,
            ),
            ReconcileError::EmptySelection => AppError::BadRequest(anyhow::anyhow!(
                "Select at least one invoice and one transaction to reconcile."
            )),
            ReconcileError::AmountMismatch {
                invoice_total,
                transaction_total,
            } => AppError::Rejected {
                message: "The sum of selected invoices and transactions must match.".to_string(),
                details: Some(format!(
                    "Invoice total: {}, transaction total: {}",
                    invoice_total, transaction_total
                )),
                errors: Vec::new(),
            },
            ReconcileError::Storage(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ReconcileError::MailDelivery(e) => AppError::EmailError(e.to_string()),
            ReconcileError::Internal(e) => AppError::InternalError(e),
        }
    }
}
