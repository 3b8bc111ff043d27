//! Shared upload pipeline: multipart → staged file → rows → validation →
//! deduplicating import → queued notification.

use crate::middleware::Operator;
use crate::models::LedgerRecord;
use crate::services::importer::{import_unique, ImportSummary};
use crate::services::metrics as reconcile_metrics;
use crate::services::{EmailMessage, ReconcileError, RecordStore};
use crate::spreadsheet::{read_sheet, ColumnMapping, SheetRow, XLSX_MIME};
use crate::startup::AppState;
use axum::extract::Multipart;
use axum::http::StatusCode;
use service_core::error::AppError;

const MIB: usize = 1024 * 1024;

/// Where an upload comes from and how its rows become records.
pub struct UploadTarget<T> {
    pub field: &'static str,
    pub mapping: &'static [ColumnMapping],
    pub validate: fn(&[SheetRow]) -> Result<Vec<T>, Vec<String>>,
}

fn size_limit_message(max_bytes: usize) -> String {
    if max_bytes % MIB == 0 {
        format!("File size must be less than {} MB", max_bytes / MIB)
    } else {
        format!("File size must be less than {} bytes", max_bytes)
    }
}

/// Pull the named file part out of the form, enforcing size and type.
pub async fn read_xlsx_field(
    multipart: &mut Multipart,
    field_name: &str,
    max_bytes: usize,
) -> Result<Vec<u8>, ReconcileError> {
    let too_large = || ReconcileError::UnsupportedMimeOrSize(size_limit_message(max_bytes));
    let malformed = |e: axum::extract::multipart::MultipartError| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            too_large()
        } else {
            ReconcileError::Internal(anyhow::anyhow!("Failed to read multipart field: {}", e))
        }
    };

    while let Some(mut field) = multipart.next_field().await.map_err(malformed)? {
        if field.name() != Some(field_name) {
            continue;
        }

        let is_xlsx = field.content_type() == Some(XLSX_MIME);

        let mut data = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(malformed)? {
            if data.len() + chunk.len() > max_bytes {
                return Err(too_large());
            }
            data.extend_from_slice(&chunk);
        }

        if !is_xlsx {
            return Err(ReconcileError::UnsupportedMimeOrSize(
                "File must be type of xlsx".to_string(),
            ));
        }
        if data.is_empty() {
            return Err(ReconcileError::MissingFile);
        }
        return Ok(data);
    }

    Err(ReconcileError::MissingFile)
}

fn validation_email(operator: &Operator, label: &str, errors: &[String]) -> EmailMessage {
    EmailMessage::new(
        operator.email(),
        format!("{} Upload Validation Errors", label),
        format!(
            "The following errors were found in the uploaded {} file:\n\n{}",
            label,
            errors.join("\n")
        ),
    )
}

fn success_email(operator: &Operator, label: &str, summary: &ImportSummary) -> EmailMessage {
    EmailMessage::new(
        operator.email(),
        format!("{} Upload Success", label),
        format!(
            "{}s uploaded successfully.\n\nInserted Count: {}\nDuplicate Count: {}\nDuplicates: {}",
            label,
            summary.inserted_count,
            summary.duplicate_count,
            summary.duplicates.join(", ")
        ),
    )
}

/// Run one upload end to end. The staged copy is removed on every path.
pub async fn import_upload<T: LedgerRecord>(
    state: &AppState,
    operator: &Operator,
    store: &dyn RecordStore<T>,
    target: UploadTarget<T>,
    mut multipart: Multipart,
) -> Result<ImportSummary, AppError> {
    let kind = T::KIND;
    let label = kind.label();

    let result = async {
        let data = read_xlsx_field(
            &mut multipart,
            target.field,
            state.config.files.max_upload_bytes,
        )
        .await?;

        tracing::info!(kind = kind.as_str(), size = data.len(), "Upload received");

        let staged = state
            .staging
            .stage(&format!("{}_upload_", kind.as_str()), data)
            .await
            .map_err(|e| ReconcileError::Internal(anyhow::anyhow!("failed to stage upload: {}", e)))?;

        let path = staged.path().to_path_buf();
        let mapping = target.mapping;
        let sheet = kind.upload_sheet();
        let rows = tokio::task::spawn_blocking(move || read_sheet(&path, mapping, sheet))
            .await
            .map_err(|e| ReconcileError::Internal(anyhow::anyhow!("sheet reader panicked: {}", e)))??;
        drop(staged);

        let records = match (target.validate)(&rows) {
            Ok(records) => records,
            Err(errors) => {
                tracing::warn!(
                    kind = kind.as_str(),
                    errors = errors.len(),
                    "Upload rejected by row validation"
                );
                state
                    .notifier
                    .enqueue("validation_errors", validation_email(operator, label, &errors))
                    .await;
                return Err(ReconcileError::FieldValidation { kind, errors });
            }
        };

        let summary = import_unique(store, records).await?;

        state
            .notifier
            .enqueue("upload_success", success_email(operator, label, &summary))
            .await;

        Ok::<_, ReconcileError>(summary)
    }
    .await;

    let outcome = match &result {
        Ok(_) => "imported",
        Err(ReconcileError::FieldValidation { .. }) => "invalid_rows",
        Err(ReconcileError::SchemaMismatch(_)) => "schema_mismatch",
        Err(ReconcileError::MissingFile) | Err(ReconcileError::UnsupportedMimeOrSize(_)) => {
            "rejected_file"
        }
        Err(_) => "error",
    };
    reconcile_metrics::record_upload(kind, outcome);

    result.map_err(AppError::from)
}
